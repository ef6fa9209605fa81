use clap::{Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{Config, FAVORITES_FILE, IconSet, LAST_USED_FILE};
use crate::error::{WifiError, WifiResult};
use crate::store::{FavoritesStore, LastUsedStore};
use crate::ui;
use crate::wifi::{ConnectIntent, Dispatcher, Notification, Notifier, Security};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan and list nearby networks
    Scan {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List saved networks with their autoconnect status
    Saved {
        #[arg(long)]
        json: bool,
    },
    /// Show the Wi-Fi device and current connection
    Status,
    /// Connect to a network
    Connect {
        ssid: String,
        /// Password or passphrase (prompted when omitted on a terminal)
        #[arg(long)]
        password: Option<String>,
        /// Username for 802.1x networks
        #[arg(long)]
        username: Option<String>,
        /// Join a network that does not broadcast its SSID
        #[arg(long)]
        hidden: bool,
        /// Security of the network; looked up from the scan when omitted
        #[arg(long, value_enum)]
        security: Option<Security>,
    },
    /// Disconnect from the current network
    Disconnect,
    /// Forget a saved network
    Forget { name: String },
    /// Toggle autoconnect for a saved network
    Autoconnect { name: String },
    /// Turn the radio on or off
    Radio {
        #[arg(value_enum)]
        power: Power,
    },
    /// Turn the radio off and on again
    Restart,
    /// Reconnect to the last network joined
    Reconnect,
    /// Manage favorite networks
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoriteAction {
    Add { ssid: String },
    Remove { ssid: String },
    List,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

pub struct App {
    dispatcher: Dispatcher,
    notifier: Arc<dyn Notifier>,
    config: Config,
    icons: IconSet,
    last_used: LastUsedStore,
    favorites: FavoritesStore,
}

impl App {
    pub fn new(dispatcher: Dispatcher, notifier: Arc<dyn Notifier>, config: Config, icons: IconSet) -> Self {
        let state_dir = config.state_dir();
        Self {
            dispatcher,
            notifier,
            last_used: LastUsedStore::new(state_dir.join(LAST_USED_FILE), config.last_used_ttl()),
            favorites: FavoritesStore::new(state_dir.join(FAVORITES_FILE)),
            config,
            icons,
        }
    }

    pub async fn run(&mut self, command: Command) -> WifiResult<()> {
        match command {
            Command::Scan { json } => self.scan(json).await,
            Command::Saved { json } => self.saved(json).await,
            Command::Status => self.status().await,
            Command::Connect {
                ssid,
                hidden,
                security,
                ..
            } => {
                let intent = if hidden {
                    ConnectIntent::hidden(ssid, security.unwrap_or(Security::Psk))
                } else {
                    ConnectIntent {
                        security,
                        ..ConnectIntent::new(ssid)
                    }
                };
                self.connect(intent).await
            }
            Command::Disconnect => {
                self.load_quietly().await;
                self.dispatcher.disconnect().await
            }
            Command::Forget { name } => self.dispatcher.forget(&name).await,
            Command::Autoconnect { name } => {
                if let Err(e) = self.dispatcher.refresh_saved().await {
                    warn!(error = %e, "could not read saved networks");
                }
                self.dispatcher.toggle_autoconnect(&name).await.map(|_| ())
            }
            Command::Radio { power } => {
                self.load_quietly().await;
                self.dispatcher.set_power(power == Power::On).await
            }
            Command::Restart => {
                self.load_quietly().await;
                self.dispatcher.restart(self.config.restart_delay()).await
            }
            Command::Reconnect => self.reconnect().await,
            Command::Favorite { action } => self.favorite(action),
        }
    }

    fn fail(&self, title: &str, error: WifiError) -> WifiResult<()> {
        self.notifier.notify(&Notification::failure(title, &error));
        Err(error)
    }

    /// Refresh before an action; gaps surface as the action's own error
    async fn load_quietly(&mut self) {
        if let Err(e) = self.dispatcher.refresh().await {
            debug!(error = %e, "initial refresh incomplete");
        }
    }

    /// Refresh for a read-only command, reporting any failure
    async fn load(&mut self) -> WifiResult<()> {
        match self.dispatcher.refresh().await {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e.title(), e),
        }
    }

    async fn scan(&mut self, json: bool) -> WifiResult<()> {
        self.load().await?;
        if self.dispatcher.view().device.is_none() {
            return self.fail(WifiError::NoDevice.title(), WifiError::NoDevice);
        }
        let favorites = self.favorites.load();
        let networks = &self.dispatcher.view().networks;
        if json {
            match ui::networks_json(networks, &favorites) {
                Ok(out) => println!("{out}"),
                Err(e) => return self.fail("Output Failed", WifiError::Store(e.to_string())),
            }
        } else {
            println!("{}", ui::render_networks(networks, &favorites, self.icons));
        }
        Ok(())
    }

    async fn saved(&mut self, json: bool) -> WifiResult<()> {
        if let Err(e) = self.dispatcher.refresh_saved().await {
            return self.fail(e.title(), e);
        }
        let saved = &self.dispatcher.view().saved;
        if json {
            match ui::saved_json(saved) {
                Ok(out) => println!("{out}"),
                Err(e) => return self.fail("Output Failed", WifiError::Store(e.to_string())),
            }
        } else {
            println!("{}", ui::render_saved(saved, self.icons));
        }
        Ok(())
    }

    async fn status(&mut self) -> WifiResult<()> {
        self.load().await?;
        let view = self.dispatcher.view();
        let favorite = view
            .current
            .as_ref()
            .is_some_and(|c| self.favorites.contains(&c.network_name));
        println!("{}", ui::render_status(view, favorite, self.icons));
        Ok(())
    }

    async fn connect(&mut self, intent: ConnectIntent) -> WifiResult<()> {
        self.load_quietly().await;
        let request = self.dispatcher.connect(intent).await?;
        if let Err(e) = self.last_used.record(request.ssid(), request.option()) {
            warn!(error = %e, "could not record last used network");
        }
        Ok(())
    }

    async fn reconnect(&mut self) -> WifiResult<()> {
        let Some(last) = self.last_used.load() else {
            return self.fail(
                "Reconnect Failed",
                WifiError::Validation("No recently used network to reconnect to".into()),
            );
        };
        debug!(network = %last.network, option = %last.option, "reconnecting");
        self.connect(ConnectIntent::new(last.network)).await
    }

    fn favorite(&self, action: FavoriteAction) -> WifiResult<()> {
        let result = match &action {
            FavoriteAction::List => {
                println!("{}", ui::render_favorites(&self.favorites.load(), self.icons));
                return Ok(());
            }
            FavoriteAction::Add { ssid } => self.favorites.add(ssid).map(|added| {
                if added {
                    format!("Added {ssid} to favorites")
                } else {
                    format!("{ssid} is already a favorite")
                }
            }),
            FavoriteAction::Remove { ssid } => self.favorites.remove(ssid).map(|removed| {
                if removed {
                    format!("Removed {ssid} from favorites")
                } else {
                    format!("{ssid} was not a favorite")
                }
            }),
        };
        match result {
            Ok(message) => {
                self.notifier
                    .notify(&Notification::success("Favorites Updated", Some(message)));
                Ok(())
            }
            Err(e) => self.fail("Updating Favorites Failed", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::backend::Nmcli;
    use crate::wifi::runner::CommandOutput;
    use crate::wifi::runner::testing::ScriptedRunner;
    use crate::wifi::{CredentialPrompt, Credentials};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Notification>>);

    impl Notifier for Collect {
        fn notify(&self, notification: &Notification) {
            self.0.lock().unwrap().push(notification.clone());
        }
    }

    struct NoPrompt;

    #[async_trait]
    impl CredentialPrompt for NoPrompt {
        async fn collect(&self, _ssid: &str, _security: Security) -> WifiResult<Credentials> {
            Ok(Credentials::default())
        }
    }

    fn build_app(runner: ScriptedRunner, state_dir: &std::path::Path) -> (App, Arc<ScriptedRunner>, Arc<Collect>) {
        let runner = Arc::new(runner);
        let notifier = Arc::new(Collect::default());
        let backend = Arc::new(Nmcli::new(runner.clone(), Duration::from_secs(30)));
        let dispatcher = Dispatcher::new(backend, notifier.clone(), Arc::new(NoPrompt));
        let config = Config {
            state_dir: Some(state_dir.to_path_buf()),
            ..Config::default()
        };
        (App::new(dispatcher, notifier.clone(), config, IconSet::Ascii), runner, notifier)
    }

    fn nmcli() -> ScriptedRunner {
        ScriptedRunner::new()
            .on(
                "nmcli device status",
                CommandOutput::success("DEVICE  TYPE  STATE  CONNECTION\nwlan0  wifi  disconnected  --"),
            )
            .on(
                "nmcli -f NAME,UUID,TYPE,AUTOCONNECT,TIMESTAMP",
                CommandOutput::success(
                    "NAME  UUID  TYPE  AUTOCONNECT  TIMESTAMP\nHome  0c5a2f5e-6d0e-4d61-9d0a-3c1c1a1a1a1a  wifi  yes  1760600000",
                ),
            )
            .on("nmcli -f NAME,UUID,TYPE,DEVICE", CommandOutput::success("NAME  UUID  TYPE  DEVICE"))
            .on(
                "nmcli device wifi list",
                CommandOutput::success(
                    "IN-USE  BSSID  SSID  MODE  CHAN  RATE  SIGNAL  BARS  SECURITY\n        AA:BB:CC:DD:EE:01  Home  Infra  6  130 Mbit/s  80  ▂▄▆_  WPA2",
                ),
            )
            .on("nmcli connection up", CommandOutput::success(""))
    }

    #[tokio::test]
    async fn connect_records_last_used_and_reconnect_replays_it() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, runner, _) = build_app(nmcli(), dir.path());

        app.run(Command::Connect {
            ssid: "Home".into(),
            password: None,
            username: None,
            hidden: false,
            security: None,
        })
        .await
        .unwrap();
        let last = app.last_used.load().unwrap();
        assert_eq!(last.network, "Home");
        assert_eq!(last.option, "saved");

        app.run(Command::Reconnect).await.unwrap();
        let ups = runner.lines().into_iter().filter(|l| l == "nmcli connection up id Home").count();
        assert_eq!(ups, 2);
    }

    #[tokio::test]
    async fn reconnect_without_history_fails_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, runner, notifier) = build_app(nmcli(), dir.path());

        assert!(app.run(Command::Reconnect).await.is_err());
        assert!(runner.calls().is_empty());
        assert_eq!(notifier.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn favorites_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, notifier) = build_app(nmcli(), dir.path());

        app.run(Command::Favorite {
            action: FavoriteAction::Add { ssid: "Home".into() },
        })
        .await
        .unwrap();
        assert!(app.favorites.contains("Home"));
        app.run(Command::Favorite {
            action: FavoriteAction::Remove { ssid: "Home".into() },
        })
        .await
        .unwrap();
        assert!(!app.favorites.contains("Home"));
        assert_eq!(notifier.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scan_fails_when_tool_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CommandOutput {
            status: crate::wifi::runner::CommandStatus::Unavailable {
                reason: "command not found".into(),
            },
            stdout: String::new(),
            stderr: String::new(),
        };
        let runner = ScriptedRunner::new().on("nmcli", missing);
        let (mut app, _, notifier) = build_app(runner, dir.path());

        let err = app.run(Command::Scan { json: false }).await.unwrap_err();
        assert!(matches!(err, WifiError::ToolUnavailable { .. }));
        let seen = notifier.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].title, "Network Tool Unavailable");
    }
}
