//! Wi-Fi management over the `nmcli` and `iwctl` command-line tools
//!
//! Commands run through a [`runner::CommandRunner`], their output is parsed in
//! [`parse`], merged for display in [`merge`], and user intents are mapped
//! to command sequences by the [`Dispatcher`].

pub mod backend;
pub mod credentials;
pub mod dispatcher;
pub mod merge;
pub mod parse;
pub mod runner;
pub mod types;

pub use credentials::{CredentialPrompt, Credentials};
pub use dispatcher::{ConnectIntent, Dispatcher, Notification, NotificationKind, Notifier};
pub use runner::ProcessRunner;
pub use types::{AnnotatedNetwork, AutoConnect, BackendKind, PowerState, SavedNetwork, Security};
