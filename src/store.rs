//! Small JSON state files kept in the per-user state directory.
//!
//! Reads never fail: a missing or corrupt file is logged and treated as empty.
//! Writes create the directory and report `WifiError::Store`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::{WifiError, WifiResult};

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable state file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt state file, ignoring");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> WifiResult<()> {
    let store_err = |e: &dyn std::fmt::Display| WifiError::Store(format!("{}: {e}", path.display()));
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| store_err(&e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| store_err(&e))?;
    fs::write(path, json).map_err(|e| store_err(&e))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The last network joined and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUsed {
    pub network: String,
    pub option: String,
    pub timestamp_ms: u64,
}

pub struct LastUsedStore {
    path: PathBuf,
    ttl: Duration,
}

impl LastUsedStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn record(&self, network: &str, option: &str) -> WifiResult<LastUsed> {
        let entry = LastUsed {
            network: network.to_string(),
            option: option.to_string(),
            timestamp_ms: now_ms(),
        };
        write_json(&self.path, &entry)?;
        debug!(network, option, "recorded last used network");
        Ok(entry)
    }

    /// The entry if it is younger than the TTL
    pub fn load(&self) -> Option<LastUsed> {
        let entry: LastUsed = read_json(&self.path)?;
        let age = now_ms().saturating_sub(entry.timestamp_ms);
        if u128::from(age) >= self.ttl.as_millis() {
            debug!(network = %entry.network, age_ms = age, "last used entry expired");
            return None;
        }
        Some(entry)
    }
}

/// SSIDs the user pinned, stored as a sorted JSON array
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> BTreeSet<String> {
        read_json(&self.path).unwrap_or_default()
    }

    pub fn contains(&self, ssid: &str) -> bool {
        self.load().contains(ssid)
    }

    /// Returns false when the SSID was already a favorite
    pub fn add(&self, ssid: &str) -> WifiResult<bool> {
        let mut favorites = self.load();
        let added = favorites.insert(ssid.to_string());
        if added {
            write_json(&self.path, &favorites)?;
        }
        Ok(added)
    }

    /// Returns false when the SSID was not a favorite
    pub fn remove(&self, ssid: &str) -> WifiResult<bool> {
        let mut favorites = self.load();
        let removed = favorites.remove(ssid);
        if removed {
            write_json(&self.path, &favorites)?;
        }
        Ok(removed)
    }
}
