use async_trait::async_trait;
use secrecy::SecretString;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{WifiError, WifiResult};
use crate::wifi::{CredentialPrompt, Credentials, Notification, NotificationKind, Notifier, Security};

/// Credentials from command-line flags, topped up interactively when stdin
/// is a terminal. Never prompts for a field that was already given.
#[derive(Debug, Default)]
pub struct ConsolePrompt {
    username: Option<String>,
    password: Option<SecretString>,
    interactive: bool,
}

impl ConsolePrompt {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username,
            password: password.map(SecretString::from),
            interactive: io::stdin().is_terminal(),
        }
    }

    fn needs_username(&self, security: Security) -> bool {
        security == Security::Enterprise && self.username.is_none()
    }
}

fn read_username(ssid: &str) -> io::Result<String> {
    eprint!("Username for {ssid}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_password(ssid: &str) -> io::Result<String> {
    rpassword::prompt_password(format!("Password for {ssid}: "))
}

#[async_trait]
impl CredentialPrompt for ConsolePrompt {
    async fn collect(&self, ssid: &str, security: Security) -> WifiResult<Credentials> {
        let mut credentials = Credentials::new(self.username.clone(), self.password.clone());
        if !self.interactive || !security.is_secured() {
            return Ok(credentials);
        }

        let ask_username = self.needs_username(security);
        let ask_password = self.password.is_none();
        if !ask_username && !ask_password {
            return Ok(credentials);
        }

        // Terminal reads block
        let owned = ssid.to_string();
        let (username, password) = tokio::task::spawn_blocking(move || -> io::Result<_> {
            let username = if ask_username { Some(read_username(&owned)?) } else { None };
            let password = if ask_password { Some(read_password(&owned)?) } else { None };
            Ok((username, password))
        })
        .await
        .map_err(|e| WifiError::Validation(format!("Credential prompt failed: {e}")))?
        .map_err(|e| WifiError::Validation(format!("Could not read credentials: {e}")))?;

        if username.is_some() {
            credentials.username = username;
        }
        if let Some(password) = password {
            credentials.password = Some(SecretString::from(password));
        }
        Ok(credentials)
    }
}

/// Prints notifications: successes to stdout, failures to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

pub fn format_notification(notification: &Notification) -> String {
    match &notification.message {
        Some(message) if !message.is_empty() => format!("{}: {}", notification.title, message),
        _ => notification.title.clone(),
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        let line = format_notification(notification);
        match notification.kind {
            NotificationKind::Success => println!("{line}"),
            NotificationKind::Failure => eprintln!("{line}"),
        }
    }
}
