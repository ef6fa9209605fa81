/// Centralized configuration for wifi-commander
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::wifi::BackendKind;

pub const APP_DIR: &str = "wifi-commander";
pub const CONFIG_FILE: &str = "config.toml";
pub const LAST_USED_FILE: &str = "last-used.json";
pub const FAVORITES_FILE: &str = "favorites.json";

// Timing
pub const COMMAND_TIMEOUT_SECS: u64 = 30;
pub const RESTART_DELAY_MS: u64 = 1000;
pub const LAST_USED_TTL_SECS: u64 = 24 * 60 * 60;

// iwctl reports signal in hundredths of a dBm when asked for rssi-dbms
pub const IWD_RSSI_SCALE: i32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    pub command_timeout_secs: u64,
    pub restart_delay_ms: u64,
    pub last_used_ttl_secs: u64,
    pub state_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Nmcli,
            command_timeout_secs: COMMAND_TIMEOUT_SECS,
            restart_delay_ms: RESTART_DELAY_MS,
            last_used_ttl_secs: LAST_USED_TTL_SECS,
            state_dir: None,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> color_eyre::eyre::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn last_used_ttl(&self) -> Duration {
        Duration::from_secs(self.last_used_ttl_secs)
    }

    /// `$XDG_STATE_HOME/wifi-commander`, or `~/.local/state/wifi-commander`
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

// Icons - Nerd Fonts
pub mod icons {
    pub mod nerd {
        pub const SAVED: &str = "󰆓 "; // nf-md-content_save
        pub const OPEN: &str = " "; // nf-fa-rss
        pub const LOCKED: &str = " "; // nf-fa-lock
        pub const CONNECTED: &str = " 󰖩"; // nf-md-wifi_check
        pub const AUTO_ON: &str = "󰁪"; // nf-md-bell
        pub const AUTO_OFF: &str = "󱧧"; // nf-md-bell_off
        pub const AUTO_UNKNOWN: &str = "󰂜"; // nf-md-bell_outline
        pub const FAVORITE: &str = "★ ";
    }

    pub mod ascii {
        pub const SAVED: &str = "[S] ";
        pub const OPEN: &str = "[O] ";
        pub const LOCKED: &str = "[*] ";
        pub const CONNECTED: &str = " <-";
        pub const AUTO_ON: &str = "(A)";
        pub const AUTO_OFF: &str = "(M)";
        pub const AUTO_UNKNOWN: &str = "(?)";
        pub const FAVORITE: &str = "+ ";
    }
}

/// Icon set to use based on configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconSet {
    #[default]
    Nerd,
    Ascii,
}

impl IconSet {
    pub fn saved(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::SAVED,
            IconSet::Ascii => icons::ascii::SAVED,
        }
    }

    pub fn open(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::OPEN,
            IconSet::Ascii => icons::ascii::OPEN,
        }
    }

    pub fn locked(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::LOCKED,
            IconSet::Ascii => icons::ascii::LOCKED,
        }
    }

    pub fn connected(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::CONNECTED,
            IconSet::Ascii => icons::ascii::CONNECTED,
        }
    }

    pub fn auto_on(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::AUTO_ON,
            IconSet::Ascii => icons::ascii::AUTO_ON,
        }
    }

    pub fn auto_off(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::AUTO_OFF,
            IconSet::Ascii => icons::ascii::AUTO_OFF,
        }
    }

    pub fn auto_unknown(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::AUTO_UNKNOWN,
            IconSet::Ascii => icons::ascii::AUTO_UNKNOWN,
        }
    }

    pub fn favorite(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::FAVORITE,
            IconSet::Ascii => icons::ascii::FAVORITE,
        }
    }
}
