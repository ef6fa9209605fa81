use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{WifiError, WifiResult};
use crate::wifi::types::{ConnectRequest, Security};

/// Whatever the user supplied for a secured network
#[derive(Debug, Default, Clone)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<SecretString>) -> Self {
        Self { username, password }
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.trim().is_empty())
    }

    fn password(&self) -> Option<&SecretString> {
        self.password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())
    }

    /// Check the fields `security` needs. Runs before anything is spawned.
    pub fn validate(&self, ssid: &str, security: Security) -> WifiResult<()> {
        match security {
            Security::Open => Ok(()),
            Security::Psk if self.password().is_none() => Err(WifiError::Validation(format!(
                "A password is required to connect to {ssid}"
            ))),
            Security::Psk => Ok(()),
            Security::Enterprise => match (self.username(), self.password()) {
                (Some(_), Some(_)) => Ok(()),
                (None, Some(_)) => Err(WifiError::Validation(format!(
                    "A username is required to connect to {ssid}"
                ))),
                (Some(_), None) => Err(WifiError::Validation(format!(
                    "A password is required to connect to {ssid}"
                ))),
                (None, None) => Err(WifiError::Validation(format!(
                    "A username and password are required to connect to {ssid}"
                ))),
            },
        }
    }

    /// Validate and build the request the backend executes
    pub fn into_request(self, ssid: &str, security: Security, hidden: bool) -> WifiResult<ConnectRequest> {
        self.validate(ssid, security)?;
        let name = ssid.to_string();
        let missing = || WifiError::Validation(format!("Incomplete credentials for {ssid}"));
        let request = match security {
            Security::Open => ConnectRequest::Open { ssid: name, hidden },
            Security::Psk => ConnectRequest::Psk {
                ssid: name,
                password: self.password.ok_or_else(missing)?,
                hidden,
            },
            Security::Enterprise => ConnectRequest::Enterprise {
                ssid: name,
                username: self.username.ok_or_else(missing)?,
                password: self.password.ok_or_else(missing)?,
                hidden,
            },
        };
        Ok(request)
    }
}

/// Collects credentials for a secured network the daemon has no profile for
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn collect(&self, ssid: &str, security: Security) -> WifiResult<Credentials>;
}
