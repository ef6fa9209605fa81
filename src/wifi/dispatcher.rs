//! Maps user intents onto backend command sequences.
//!
//! Every action reports exactly one notification and then re-reads daemon
//! state. A refresh failure is logged and never replaces the action's own
//! result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{WifiError, WifiResult};
use crate::wifi::backend::WifiBackend;
use crate::wifi::credentials::{CredentialPrompt, Credentials};
use crate::wifi::merge::merge;
use crate::wifi::types::{
    AnnotatedNetwork, AutoConnect, ConnectRequest, ConnectionState, CurrentConnection, SavedNetwork,
    Security, WifiDevice, WifiNetwork,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message,
        }
    }

    pub fn failure(title: impl Into<String>, error: &WifiError) -> Self {
        Self {
            kind: NotificationKind::Failure,
            title: title.into(),
            message: Some(error.detail()),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Last known daemon state
#[derive(Debug, Clone, Default)]
pub struct NetworkView {
    pub device: Option<WifiDevice>,
    pub current: Option<CurrentConnection>,
    pub saved: Vec<SavedNetwork>,
    pub scan: Vec<WifiNetwork>,
    pub networks: Vec<AnnotatedNetwork>,
}

impl NetworkView {
    pub fn saved_network(&self, name: &str) -> Option<&SavedNetwork> {
        self.saved.iter().find(|s| s.name == name)
    }

    /// Strongest scanned access point for `ssid`
    pub fn scanned(&self, ssid: &str) -> Option<&WifiNetwork> {
        self.scan
            .iter()
            .filter(|n| !n.ssid.is_empty() && n.ssid == ssid)
            .max_by_key(|n| n.signal.quality())
    }

    fn remerge(&mut self) {
        self.networks = merge(self.scan.clone(), &self.saved, self.current.as_ref());
    }
}

/// A request to join a network. `security` is looked up from the last scan
/// or the saved list when not given.
#[derive(Debug, Clone)]
pub struct ConnectIntent {
    pub ssid: String,
    pub security: Option<Security>,
    pub hidden: bool,
}

impl ConnectIntent {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            security: None,
            hidden: false,
        }
    }

    pub fn hidden(ssid: impl Into<String>, security: Security) -> Self {
        Self {
            ssid: ssid.into(),
            security: Some(security),
            hidden: true,
        }
    }
}

pub struct Dispatcher {
    backend: Arc<dyn WifiBackend>,
    notifier: Arc<dyn Notifier>,
    prompt: Arc<dyn CredentialPrompt>,
    view: NetworkView,
    states: HashMap<String, ConnectionState>,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn WifiBackend>,
        notifier: Arc<dyn Notifier>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self {
        Self {
            backend,
            notifier,
            prompt,
            view: NetworkView::default(),
            states: HashMap::new(),
        }
    }

    pub fn view(&self) -> &NetworkView {
        &self.view
    }

    pub fn state_of(&self, network: &str) -> ConnectionState {
        self.states.get(network).copied().unwrap_or_default()
    }

    /// Re-read device, saved list, current connection and scan.
    ///
    /// Each piece is independent: a failure is logged and the previous value
    /// kept. Returns the first error so read-only callers can report it.
    pub async fn refresh(&mut self) -> WifiResult<()> {
        let mut first_error: Option<WifiError> = None;
        let mut note = |what: &str, e: WifiError| {
            warn!(piece = what, error = %e, "refresh failed");
            first_error.get_or_insert(e);
        };

        let (device, saved) = tokio::join!(self.backend.device(), self.backend.list_saved());
        match device {
            Ok(device) => self.view.device = device,
            Err(e) => note("device", e),
        }
        match saved {
            Ok(saved) => self.view.saved = saved,
            Err(e) => note("saved", e),
        }

        if let Some(device) = self.view.device.clone() {
            let (current, scan) = tokio::join!(
                self.backend.current_connection(&device),
                self.backend.scan(&device)
            );
            match current {
                Ok(current) => self.view.current = current,
                Err(e) => note("current", e),
            }
            match scan {
                Ok(scan) => self.view.scan = scan,
                Err(e) => note("scan", e),
            }
        } else {
            debug!("no Wi-Fi device, skipping scan");
            self.view.current = None;
            self.view.scan.clear();
        }

        self.view.remerge();
        self.sync_states();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Re-read only the saved list
    pub async fn refresh_saved(&mut self) -> WifiResult<()> {
        self.view.saved = self.backend.list_saved().await?;
        self.view.remerge();
        Ok(())
    }

    /// Observed daemon state overrides the tracked lifecycle
    fn sync_states(&mut self) {
        let current = self.view.current.as_ref().map(|c| c.network_name.as_str());
        for (name, state) in self.states.iter_mut() {
            if *state == ConnectionState::Connected && Some(name.as_str()) != current {
                *state = ConnectionState::Disconnected;
            }
        }
        if let Some(name) = current {
            self.states.insert(name.to_string(), ConnectionState::Connected);
        }
    }

    fn advance(&mut self, network: &str, next: ConnectionState) -> WifiResult<()> {
        let next = self.state_of(network).transition(network, next)?;
        self.states.insert(network.to_string(), next);
        Ok(())
    }

    async fn refresh_after(&mut self) {
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "post-action refresh incomplete");
        }
    }

    fn report<T>(&self, result: &WifiResult<T>, success: Notification, failure_title: &str) {
        match result {
            Ok(_) => self.notifier.notify(&success),
            Err(e) => self.notifier.notify(&Notification::failure(failure_title, e)),
        }
    }

    /// Decide how to connect. Prompts and validates before anything spawns.
    async fn build_request(&self, intent: &ConnectIntent) -> WifiResult<ConnectRequest> {
        let saved = self.view.saved_network(&intent.ssid);

        if intent.hidden {
            let security = intent.security.unwrap_or(Security::Psk);
            return self.collect(&intent.ssid, security, true).await;
        }

        let security = intent
            .security
            .or_else(|| self.view.scanned(&intent.ssid).map(|n| n.security))
            .or_else(|| saved.and_then(|s| s.security));

        match (security, saved) {
            (Some(Security::Open), _) => Ok(ConnectRequest::Open {
                ssid: intent.ssid.clone(),
                hidden: false,
            }),
            (_, Some(saved)) => Ok(ConnectRequest::Saved {
                name: saved.name.clone(),
            }),
            (Some(security), None) => self.collect(&intent.ssid, security, false).await,
            (None, None) => Err(WifiError::Validation(format!(
                "{} was not found; connect with --hidden to join it directly",
                intent.ssid
            ))),
        }
    }

    async fn collect(&self, ssid: &str, security: Security, hidden: bool) -> WifiResult<ConnectRequest> {
        let credentials = if security.is_secured() {
            self.prompt.collect(ssid, security).await?
        } else {
            Credentials::default()
        };
        credentials.into_request(ssid, security, hidden)
    }

    /// Connect and return the request that succeeded
    pub async fn connect(&mut self, intent: ConnectIntent) -> WifiResult<ConnectRequest> {
        let result = self.try_connect(&intent).await;
        self.report(
            &result,
            Notification::success("Connection Successful", Some(format!("Connected to {}", intent.ssid))),
            "Connection Failed",
        );
        if !matches!(result, Err(WifiError::Validation(_))) {
            self.refresh_after().await;
        }
        result
    }

    async fn try_connect(&mut self, intent: &ConnectIntent) -> WifiResult<ConnectRequest> {
        let request = self.build_request(intent).await?;
        let device = self.view.device.clone().ok_or(WifiError::NoDevice)?;
        let name = request.ssid().to_string();

        self.advance(&name, ConnectionState::Connecting)?;
        info!(network = %name, option = request.option(), "connecting");
        match self.backend.connect(&device, &request).await {
            Ok(()) => {
                self.advance(&name, ConnectionState::Connected)?;
                Ok(request)
            }
            Err(e) => {
                self.advance(&name, ConnectionState::Failed)?;
                Err(e)
            }
        }
    }

    pub async fn disconnect(&mut self) -> WifiResult<()> {
        let result = self.try_disconnect().await;
        self.report(&result, Notification::success("Disconnected", None), "Disconnect Failed");
        self.refresh_after().await;
        result
    }

    async fn try_disconnect(&mut self) -> WifiResult<()> {
        let device = self.view.device.clone().ok_or(WifiError::NoDevice)?;
        let current = self
            .view
            .current
            .as_ref()
            .map(|c| c.network_name.clone())
            .filter(|name| self.state_of(name) == ConnectionState::Connected);

        if let Some(name) = &current {
            self.advance(name, ConnectionState::Disconnecting)?;
        }
        let result = self.backend.disconnect(&device).await;
        if let Some(name) = &current {
            let next = if result.is_ok() {
                ConnectionState::Disconnected
            } else {
                ConnectionState::Connected
            };
            self.advance(name, next)?;
        }
        result
    }

    /// Remove a saved profile. The saved list is always re-read afterwards,
    /// then the rest of the view, since forgetting the active profile drops
    /// the connection.
    pub async fn forget(&mut self, name: &str) -> WifiResult<()> {
        let result = self.backend.forget(name).await;
        self.report(
            &result,
            Notification::success("Network Forgotten", Some(format!("Forgot {name}"))),
            "Failed to Forget Network",
        );
        if let Err(e) = self.refresh_saved().await {
            warn!(error = %e, "could not re-read saved networks");
        }
        self.refresh_after().await;
        result
    }

    /// Invert the autoconnect flag of a saved network
    pub async fn toggle_autoconnect(&mut self, name: &str) -> WifiResult<bool> {
        let result = self.try_toggle_autoconnect(name).await;
        let message = match &result {
            Ok(true) => format!("Autoconnect enabled for {name}"),
            _ => format!("Autoconnect disabled for {name}"),
        };
        self.report(
            &result,
            Notification::success("Autoconnect Updated", Some(message)),
            "Toggling Autoconnect Failed",
        );
        if !matches!(
            result,
            Err(WifiError::AutoconnectUnknown(_) | WifiError::NotSaved(_))
        ) {
            self.refresh_after().await;
        }
        result
    }

    async fn try_toggle_autoconnect(&mut self, name: &str) -> WifiResult<bool> {
        let saved = self
            .view
            .saved_network(name)
            .ok_or_else(|| WifiError::NotSaved(name.to_string()))?;
        let enable = match saved.auto_connect {
            AutoConnect::Yes => false,
            AutoConnect::No => true,
            AutoConnect::Unknown => return Err(WifiError::AutoconnectUnknown(name.to_string())),
        };
        self.backend.set_autoconnect(name, enable).await?;
        Ok(enable)
    }

    pub async fn set_power(&mut self, on: bool) -> WifiResult<()> {
        let result = self.try_set_power(on).await;
        let (title, failure) = if on {
            ("Wi-Fi Turned On", "Failed to Turn On Wi-Fi")
        } else {
            ("Wi-Fi Turned Off", "Failed to Turn Off Wi-Fi")
        };
        self.report(&result, Notification::success(title, None), failure);
        self.refresh_after().await;
        result
    }

    async fn try_set_power(&self, on: bool) -> WifiResult<()> {
        let device = self.view.device.as_ref().ok_or(WifiError::NoDevice)?;
        self.backend.set_power(device, on).await
    }

    /// Power off, wait `delay`, power on. Aborts when power-off fails.
    pub async fn restart(&mut self, delay: Duration) -> WifiResult<()> {
        let result = self.try_restart(delay).await;
        self.report(&result, Notification::success("Wi-Fi Restarted", None), "Failed to Restart Wi-Fi");
        self.refresh_after().await;
        result
    }

    async fn try_restart(&self, delay: Duration) -> WifiResult<()> {
        self.try_set_power(false).await?;
        tokio::time::sleep(delay).await;
        self.try_set_power(true).await
    }
}
