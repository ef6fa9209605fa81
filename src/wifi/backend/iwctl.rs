use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{WifiBackend, args, on_off, yes_no};
use crate::error::WifiResult;
use crate::wifi::parse::iwctl as parse;
use crate::wifi::runner::CommandRunner;
use crate::wifi::types::{
    BackendKind, ConnectRequest, CurrentConnection, SavedNetwork, WifiDevice, WifiNetwork,
};

const PROGRAM: &str = "iwctl";

/// iwd through `iwctl`
pub struct Iwctl {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl Iwctl {
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

    /// One `get-bsses` query per network; the listing itself carries none
    async fn fill_bssids(&self, device: &WifiDevice, networks: &mut [WifiNetwork]) {
        for network in networks.iter_mut() {
            match self
                .bounded(args(["station", &device.name, "get-bsses", &network.ssid]))
                .await
            {
                Ok(out) => {
                    network.bssid = parse::parse_bssid(&out);
                    if network.bssid.is_none() {
                        debug!(ssid = %network.ssid, "no BSSID in get-bsses output");
                    }
                }
                Err(e) => debug!(ssid = %network.ssid, error = %e, "BSSID lookup failed"),
            }
        }
    }

    fn connect_args(device: &WifiDevice, request: &ConnectRequest) -> Vec<String> {
        let (mut cmd, ssid, hidden) = match request {
            ConnectRequest::Saved { name } => (Vec::new(), name, false),
            ConnectRequest::Open { ssid, hidden } => (Vec::new(), ssid, *hidden),
            ConnectRequest::Psk {
                ssid,
                password,
                hidden,
            } => (args(["--passphrase", password.expose_secret()]), ssid, *hidden),
            ConnectRequest::Enterprise {
                ssid,
                username,
                password,
                hidden,
            } => (
                args(["--username", username, "--password", password.expose_secret()]),
                ssid,
                *hidden,
            ),
        };
        let verb = if hidden { "connect-hidden" } else { "connect" };
        cmd.extend(args(["--dont-ask", "station", &device.name, verb, ssid]));
        cmd
    }
}

#[async_trait]
impl WifiBackend for Iwctl {
    fn kind(&self) -> BackendKind {
        BackendKind::Iwctl
    }

    async fn device(&self) -> WifiResult<Option<WifiDevice>> {
        let out = self.bounded(args(["device", "list"])).await?;
        let mut devices = parse::parse_devices(&out);
        let station = devices
            .iter()
            .position(|d| d.mode.as_deref() == Some("station"))
            .unwrap_or(0);
        Ok((!devices.is_empty()).then(|| devices.swap_remove(station)))
    }

    async fn scan(&self, device: &WifiDevice) -> WifiResult<Vec<WifiNetwork>> {
        // iwd refuses a scan while one is in flight; list whatever it has
        if let Err(e) = self.bounded(args(["station", &device.name, "scan"])).await {
            debug!(error = %e, "station scan not started");
        }
        let out = self
            .unbounded(args(["station", &device.name, "get-networks", "rssi-dbms"]))
            .await?;
        let mut networks = parse::parse_networks(&out);
        self.fill_bssids(device, &mut networks).await;
        Ok(networks)
    }

    async fn list_saved(&self) -> WifiResult<Vec<SavedNetwork>> {
        let out = self.bounded(args(["known-networks", "list"])).await?;
        let mut saved = parse::parse_known_networks(&out);

        for network in saved.iter_mut() {
            match self
                .bounded(args(["known-networks", &network.name, "show"]))
                .await
            {
                Ok(out) => network.auto_connect = parse::parse_known_network_autoconnect(&out),
                Err(e) => warn!(network = %network.name, error = %e, "could not read autoconnect"),
            }
        }
        Ok(saved)
    }

    async fn current_connection(&self, device: &WifiDevice) -> WifiResult<Option<CurrentConnection>> {
        let out = self.bounded(args(["station", &device.name, "show"])).await?;
        Ok(parse::parse_station_show(&out).map(|network_name| CurrentConnection {
            network_name,
            device_name: device.name.clone(),
        }))
    }

    async fn connect(&self, device: &WifiDevice, request: &ConnectRequest) -> WifiResult<()> {
        self.unbounded(Self::connect_args(device, request)).await?;
        Ok(())
    }

    async fn disconnect(&self, device: &WifiDevice) -> WifiResult<()> {
        self.bounded(args(["station", &device.name, "disconnect"])).await?;
        Ok(())
    }

    async fn forget(&self, name: &str) -> WifiResult<()> {
        self.bounded(args(["known-networks", name, "forget"])).await?;
        Ok(())
    }

    async fn set_autoconnect(&self, name: &str, enabled: bool) -> WifiResult<()> {
        self.bounded(args([
            "known-networks",
            name,
            "set-property",
            "AutoConnect",
            yes_no(enabled),
        ]))
        .await?;
        Ok(())
    }

    async fn set_power(&self, device: &WifiDevice, on: bool) -> WifiResult<()> {
        self.bounded(args(["device", &device.name, "set-property", "Powered", on_off(on)]))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::runner::CommandOutput;
    use crate::wifi::runner::testing::ScriptedRunner;
    use crate::wifi::types::{AutoConnect, PowerState};
    use secrecy::SecretString;

    const NETWORKS: &str = "
                               Available networks
--------------------------------------------------------------------------------
      Network name                      Security            Signal
--------------------------------------------------------------------------------
  >   Home                              psk                 -4500
      Cafe                              open                -7200
";

    const BSSES: &str = "
                           Available BSSes
--------------------------------------------------------------------------------
      BSSID               Frequency  Signal
--------------------------------------------------------------------------------
      11:22:33:44:55:66   5180       -4500
";

    const KNOWN: &str = "
                               Known Networks
--------------------------------------------------------------------------------
  Name                              Security     Hidden    Last connected
--------------------------------------------------------------------------------
  Home                              psk                    Oct 16, 10:12 AM
  Lab                               psk          yes       Oct 10, 8:00 PM
";

    const HOME_SHOW: &str = "
                           Known Network: Home
--------------------------------------------------------------------------------
  Settable  Property              Value
--------------------------------------------------------------------------------
       *    AutoConnect           yes
";

    fn wlan0() -> WifiDevice {
        WifiDevice {
            name: "wlan0".into(),
            address: Some("aa:bb:cc:dd:ee:ff".into()),
            powered: PowerState::On,
            mode: Some("station".into()),
            state: None,
        }
    }

    fn backend(runner: &Arc<ScriptedRunner>) -> Iwctl {
        Iwctl::new(runner.clone(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn scan_tolerates_busy_scanner_and_resolves_bssids() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("iwctl station wlan0 scan", CommandOutput::failure("Operation already in progress"))
                .on("iwctl station wlan0 get-networks", CommandOutput::success(NETWORKS))
                .on("iwctl station wlan0 get-bsses Home", CommandOutput::success(BSSES))
                .on("iwctl station wlan0 get-bsses Cafe", CommandOutput::failure("Not found")),
        );
        let networks = backend(&runner).scan(&wlan0()).await.unwrap();

        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].bssid.as_deref(), Some("11:22:33:44:55:66"));
        assert_eq!(networks[1].bssid, None);
        // one scan, one listing, one lookup per network
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn saved_autoconnect_unknown_when_show_fails() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("iwctl known-networks list", CommandOutput::success(KNOWN))
                .on("iwctl known-networks Home show", CommandOutput::success(HOME_SHOW))
                .on("iwctl known-networks Lab show", CommandOutput::failure("Not found")),
        );
        let saved = backend(&runner).list_saved().await.unwrap();
        assert_eq!(saved[0].auto_connect, AutoConnect::Yes);
        assert_eq!(saved[1].auto_connect, AutoConnect::Unknown);
    }

    #[test]
    fn connect_args_per_request() {
        let dev = wlan0();
        let open = ConnectRequest::Open {
            ssid: "Cafe".into(),
            hidden: false,
        };
        assert_eq!(
            Iwctl::connect_args(&dev, &open),
            args(["--dont-ask", "station", "wlan0", "connect", "Cafe"])
        );

        let psk = ConnectRequest::Psk {
            ssid: "Lab".into(),
            password: SecretString::from("s3cret".to_string()),
            hidden: true,
        };
        assert_eq!(
            Iwctl::connect_args(&dev, &psk),
            args(["--passphrase", "s3cret", "--dont-ask", "station", "wlan0", "connect-hidden", "Lab"])
        );

        let eap = ConnectRequest::Enterprise {
            ssid: "Campus".into(),
            username: "alice".into(),
            password: SecretString::from("pw".to_string()),
            hidden: false,
        };
        assert_eq!(
            Iwctl::connect_args(&dev, &eap),
            args([
                "--username", "alice", "--password", "pw", "--dont-ask", "station", "wlan0", "connect",
                "Campus"
            ])
        );
    }

    #[tokio::test]
    async fn current_connection_carries_device() {
        let runner = Arc::new(ScriptedRunner::new().on(
            "iwctl station wlan0 show",
            CommandOutput::success(
                "Station: wlan0\n----\nSettable  Property  Value\n----\n  State  connected\n  Connected network  Home\n",
            ),
        ));
        let current = backend(&runner).current_connection(&wlan0()).await.unwrap().unwrap();
        assert_eq!(current.network_name, "Home");
        assert_eq!(current.device_name, "wlan0");
    }

    #[tokio::test]
    async fn power_uses_device_property() {
        let runner = Arc::new(ScriptedRunner::new().on("iwctl device wlan0 set-property", CommandOutput::success("")));
        backend(&runner).set_power(&wlan0(), true).await.unwrap();
        assert_eq!(runner.lines(), ["iwctl device wlan0 set-property Powered on"]);
    }
}
