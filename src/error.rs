/// Typed errors for wifi-commander operations
use thiserror::Error;

/// Result type alias for WiFi operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Errors that can occur during WiFi operations
#[derive(Error, Debug)]
pub enum WifiError {
    #[error("{program} is not available: {reason}")]
    ToolUnavailable { program: String, reason: String },

    #[error("{program} failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("{0}")]
    Validation(String),

    #[error("No Wi-Fi device found")]
    NoDevice,

    #[error("{0} is not a saved network")]
    NotSaved(String),

    #[error("Could not read the autoconnect status of {0}")]
    AutoconnectUnknown(String),

    #[error("Invalid connection transition for {network}: {from} -> {to}")]
    InvalidTransition {
        network: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("State store error: {0}")]
    Store(String),
}

impl WifiError {
    /// Short notification title for this failure
    pub fn title(&self) -> &'static str {
        match self {
            WifiError::ToolUnavailable { .. } => "Network Tool Unavailable",
            WifiError::CommandFailed { .. } => "Network Command Failed",
            WifiError::Timeout { .. } => "Network Command Timed Out",
            WifiError::Validation(_) => "Missing Credentials",
            WifiError::NoDevice => "No Wi-Fi Device",
            WifiError::NotSaved(_) | WifiError::AutoconnectUnknown(_) => {
                "Toggling Autoconnect Failed"
            }
            WifiError::InvalidTransition { .. } => "Internal Error",
            WifiError::Store(_) => "State Store Error",
        }
    }

    /// Message shown under the title. Command failures surface stderr verbatim.
    pub fn detail(&self) -> String {
        match self {
            WifiError::CommandFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
