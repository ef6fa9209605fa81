//! Daemon backends behind one capability set

mod iwctl;
mod nmcli;

pub use iwctl::Iwctl;
pub use nmcli::Nmcli;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::WifiResult;
use crate::wifi::runner::CommandRunner;
use crate::wifi::types::{
    BackendKind, ConnectRequest, CurrentConnection, SavedNetwork, WifiDevice, WifiNetwork,
};

#[async_trait]
pub trait WifiBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// The Wi-Fi device, or `None` when the daemon reports none
    async fn device(&self) -> WifiResult<Option<WifiDevice>>;

    async fn scan(&self, device: &WifiDevice) -> WifiResult<Vec<WifiNetwork>>;

    async fn list_saved(&self) -> WifiResult<Vec<SavedNetwork>>;

    async fn current_connection(&self, device: &WifiDevice) -> WifiResult<Option<CurrentConnection>>;

    async fn connect(&self, device: &WifiDevice, request: &ConnectRequest) -> WifiResult<()>;

    async fn disconnect(&self, device: &WifiDevice) -> WifiResult<()>;

    async fn forget(&self, name: &str) -> WifiResult<()>;

    async fn set_autoconnect(&self, name: &str, enabled: bool) -> WifiResult<()>;

    async fn set_power(&self, device: &WifiDevice, on: bool) -> WifiResult<()>;
}

/// Build the backend selected by configuration
pub fn build(kind: BackendKind, runner: Arc<dyn CommandRunner>, timeout: Duration) -> Arc<dyn WifiBackend> {
    match kind {
        BackendKind::Nmcli => Arc::new(Nmcli::new(runner, timeout)),
        BackendKind::Iwctl => Arc::new(Iwctl::new(runner, timeout)),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn args<const N: usize>(list: [&str; N]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
