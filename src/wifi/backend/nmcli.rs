use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{WifiBackend, args, on_off, yes_no};
use crate::error::WifiResult;
use crate::wifi::parse::nmcli as parse;
use crate::wifi::runner::CommandRunner;
use crate::wifi::types::{
    BackendKind, ConnectRequest, CurrentConnection, SavedNetwork, WifiDevice, WifiNetwork,
};

const PROGRAM: &str = "nmcli";

/// NetworkManager through `nmcli`
pub struct Nmcli {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl Nmcli {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn bounded(&self, args: Vec<String>) -> WifiResult<String> {
        self.runner
            .run(PROGRAM, &args, Some(self.timeout))
            .await
            .into_stdout(PROGRAM)
    }

    async fn unbounded(&self, args: Vec<String>) -> WifiResult<String> {
        self.runner.run(PROGRAM, &args, None).await.into_stdout(PROGRAM)
    }
}

#[async_trait]
impl WifiBackend for Nmcli {
    fn kind(&self) -> BackendKind {
        BackendKind::Nmcli
    }

    async fn device(&self) -> WifiResult<Option<WifiDevice>> {
        let out = self.bounded(args(["device", "status"])).await?;
        Ok(parse::parse_wifi_device(&out))
    }

    async fn scan(&self, _device: &WifiDevice) -> WifiResult<Vec<WifiNetwork>> {
        let out = self
            .unbounded(args(["device", "wifi", "list", "--rescan", "yes"]))
            .await?;
        Ok(parse::parse_wifi_list(&out))
    }

    async fn list_saved(&self) -> WifiResult<Vec<SavedNetwork>> {
        let out = self
            .bounded(args([
                "-f",
                "NAME,UUID,TYPE,AUTOCONNECT,TIMESTAMP",
                "connection",
                "show",
            ]))
            .await?;
        Ok(parse::parse_saved_connections(&out))
    }

    async fn current_connection(&self, _device: &WifiDevice) -> WifiResult<Option<CurrentConnection>> {
        let out = self
            .bounded(args(["-f", "NAME,UUID,TYPE,DEVICE", "connection", "show", "--active"]))
            .await?;
        Ok(parse::parse_current_connection(&out))
    }

    async fn connect(&self, device: &WifiDevice, request: &ConnectRequest) -> WifiResult<()> {
        match request {
            ConnectRequest::Saved { name } => {
                self.unbounded(args(["connection", "up", "id", name])).await?;
            }
            ConnectRequest::Open { ssid, hidden } => {
                let mut cmd = args(["device", "wifi", "connect", ssid, "ifname", &device.name]);
                if *hidden {
                    cmd.extend(args(["hidden", "yes"]));
                }
                self.unbounded(cmd).await?;
            }
            ConnectRequest::Psk {
                ssid,
                password,
                hidden,
            } => {
                let mut cmd = args([
                    "device",
                    "wifi",
                    "connect",
                    ssid,
                    "password",
                    password.expose_secret(),
                    "ifname",
                    &device.name,
                ]);
                if *hidden {
                    cmd.extend(args(["hidden", "yes"]));
                }
                self.unbounded(cmd).await?;
            }
            ConnectRequest::Enterprise {
                ssid,
                username,
                password,
                hidden,
            } => {
                // `device wifi connect` has no 802.1x options, so add a profile first
                info!(ssid = %ssid, "creating 802.1x profile");
                self.bounded(args([
                    "connection",
                    "add",
                    "type",
                    "wifi",
                    "con-name",
                    ssid,
                    "ifname",
                    &device.name,
                    "ssid",
                    ssid,
                    "wifi.hidden",
                    yes_no(*hidden),
                    "wifi-sec.key-mgmt",
                    "wpa-eap",
                    "802-1x.eap",
                    "peap",
                    "802-1x.phase2-auth",
                    "mschapv2",
                    "802-1x.identity",
                    username,
                    "802-1x.password",
                    password.expose_secret(),
                ]))
                .await?;
                // A profile that never activated would be replayed on the next connect
                if let Err(e) = self.unbounded(args(["connection", "up", "id", ssid])).await {
                    if let Err(cleanup) = self.bounded(args(["connection", "delete", "id", ssid])).await {
                        warn!(ssid = %ssid, error = %cleanup, "could not remove 802.1x profile");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn disconnect(&self, device: &WifiDevice) -> WifiResult<()> {
        self.bounded(args(["device", "disconnect", &device.name])).await?;
        Ok(())
    }

    async fn forget(&self, name: &str) -> WifiResult<()> {
        self.bounded(args(["connection", "delete", "id", name])).await?;
        Ok(())
    }

    async fn set_autoconnect(&self, name: &str, enabled: bool) -> WifiResult<()> {
        self.bounded(args([
            "connection",
            "modify",
            "id",
            name,
            "connection.autoconnect",
            yes_no(enabled),
        ]))
        .await?;
        Ok(())
    }

    async fn set_power(&self, _device: &WifiDevice, on: bool) -> WifiResult<()> {
        self.bounded(args(["radio", "wifi", on_off(on)])).await?;
        Ok(())
    }
}
