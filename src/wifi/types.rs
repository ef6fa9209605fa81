use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WifiError, WifiResult};

/// Which network daemon the commands are issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// NetworkManager via nmcli
    Nmcli,
    /// iwd via iwctl
    Iwctl,
}

impl BackendKind {
    pub fn program(&self) -> &'static str {
        match self {
            BackendKind::Nmcli => "nmcli",
            BackendKind::Iwctl => "iwctl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    Open,
    Psk,
    Enterprise,
}

impl Security {
    /// Map a daemon's security label (`WPA2 WPA3`, `--`, `psk`, `8021x`, ...)
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let lower = label.to_ascii_lowercase();
        if lower.is_empty() || lower == "--" || lower == "open" || lower == "none" {
            Security::Open
        } else if lower.contains("802.1x") || lower.starts_with("8021x") || lower.contains("eap") {
            Security::Enterprise
        } else {
            Security::Psk
        }
    }

    pub fn is_secured(&self) -> bool {
        !matches!(self, Security::Open)
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Security::Open => "open",
            Security::Psk => "psk",
            Security::Enterprise => "enterprise",
        };
        f.write_str(s)
    }
}

/// Signal strength as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "unit", content = "value")]
pub enum Signal {
    /// nmcli: 0..=100
    Percent(u8),
    /// iwctl: -100..=0
    Dbm(i32),
}

impl Signal {
    /// Normalized 0..=100 quality used for ordering across units
    pub fn quality(&self) -> u8 {
        match *self {
            Signal::Percent(p) => p.min(100),
            Signal::Dbm(rssi) if rssi <= -100 => 0,
            Signal::Dbm(rssi) if rssi >= -50 => 100,
            Signal::Dbm(rssi) => (2 * (rssi + 100)) as u8,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Percent(p) => write!(f, "{p}%"),
            Signal::Dbm(d) => write!(f, "{d} dBm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

/// The radio interface reported by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiDevice {
    pub name: String,
    pub address: Option<String>,
    pub powered: PowerState,
    pub mode: Option<String>,
    pub state: Option<String>,
}

/// One scanned access point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiNetwork {
    /// Empty for hidden networks
    pub ssid: String,
    pub bssid: Option<String>,
    pub security: Security,
    pub signal: Signal,
    pub in_use: bool,
}

impl WifiNetwork {
    pub fn display_name(&self) -> &str {
        if self.ssid.is_empty() {
            "Hidden Network"
        } else {
            &self.ssid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoConnect {
    Yes,
    No,
    Unknown,
}

impl AutoConnect {
    pub fn from_flag(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => AutoConnect::Yes,
            "no" | "false" | "off" => AutoConnect::No,
            _ => AutoConnect::Unknown,
        }
    }
}

/// A network profile persisted by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedNetwork {
    pub name: String,
    pub security: Option<Security>,
    pub hidden: bool,
    pub last_used: Option<String>,
    pub auto_connect: AutoConnect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentConnection {
    pub network_name: String,
    pub device_name: String,
}

/// A scanned network annotated with saved and current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedNetwork {
    #[serde(flatten)]
    pub network: WifiNetwork,
    pub saved: bool,
    pub current: bool,
    pub auto_connect: AutoConnect,
}

/// How the daemon should be asked to connect
#[derive(Debug, Clone)]
pub enum ConnectRequest {
    Open {
        ssid: String,
        hidden: bool,
    },
    Saved {
        name: String,
    },
    Psk {
        ssid: String,
        password: SecretString,
        hidden: bool,
    },
    Enterprise {
        ssid: String,
        username: String,
        password: SecretString,
        hidden: bool,
    },
}

impl ConnectRequest {
    pub fn ssid(&self) -> &str {
        match self {
            ConnectRequest::Open { ssid, .. }
            | ConnectRequest::Psk { ssid, .. }
            | ConnectRequest::Enterprise { ssid, .. } => ssid,
            ConnectRequest::Saved { name } => name,
        }
    }

    /// Label stored in the last-used record
    pub fn option(&self) -> &'static str {
        match self {
            ConnectRequest::Open { hidden: true, .. }
            | ConnectRequest::Psk { hidden: true, .. }
            | ConnectRequest::Enterprise { hidden: true, .. } => "hidden",
            ConnectRequest::Open { .. } => "open",
            ConnectRequest::Saved { .. } => "saved",
            ConnectRequest::Psk { .. } => "password",
            ConnectRequest::Enterprise { .. } => "enterprise",
        }
    }
}

/// Per-network connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Disconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }

    /// Validate a move to `next`.
    ///
    /// `Connecting` may be entered from any settled state since the user can
    /// switch networks without disconnecting first.
    pub fn transition(self, network: &str, next: ConnectionState) -> WifiResult<ConnectionState> {
        use ConnectionState::*;
        let allowed = matches!(
            (self, next),
            (Disconnected | Failed | Connected, Connecting)
                | (Connecting, Connected | Failed)
                | (Connected, Disconnecting)
                | (Disconnecting, Disconnected | Connected)
        );
        if allowed {
            Ok(next)
        } else {
            Err(WifiError::InvalidTransition {
                network: network.to_string(),
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}
