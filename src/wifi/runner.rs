use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{WifiError, WifiResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failed { code: Option<i32> },
    TimedOut { after: Duration },
    Unavailable { reason: String },
}

/// Captured result of one process run. Never an `Err`: callers decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Convert into stdout or the matching typed error
    pub fn into_stdout(self, program: &str) -> WifiResult<String> {
        match self.status {
            CommandStatus::Success => Ok(self.stdout),
            CommandStatus::Failed { code } => {
                let message = if self.stderr.is_empty() {
                    match code {
                        Some(code) => format!("exited with status {code}"),
                        None => "terminated by signal".to_string(),
                    }
                } else {
                    self.stderr
                };
                Err(WifiError::CommandFailed {
                    program: program.to_string(),
                    message,
                })
            }
            CommandStatus::TimedOut { after } => Err(WifiError::Timeout {
                program: program.to_string(),
                secs: after.as_secs(),
            }),
            CommandStatus::Unavailable { reason } => Err(WifiError::ToolUnavailable {
                program: program.to_string(),
                reason,
            }),
        }
    }
}

/// Runs external commands. The seam that tests replace.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], timeout: Option<Duration>) -> CommandOutput;
}

/// Spawns real processes through tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String], timeout: Option<Duration>) -> CommandOutput {
        debug!(program, ?args, ?timeout, "spawning");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::NotFound => "command not found".to_string(),
                    ErrorKind::PermissionDenied => "permission denied".to_string(),
                    _ => e.to_string(),
                };
                warn!(program, %reason, "spawn failed");
                return CommandOutput {
                    status: CommandStatus::Unavailable { reason },
                    stdout: String::new(),
                    stderr: String::new(),
                };
            }
        };

        // Dropping the future on timeout drops the child, which kills it
        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(program, ?limit, "command timed out");
                    return CommandOutput {
                        status: CommandStatus::TimedOut { after: limit },
                        stdout: String::new(),
                        stderr: "timed out".to_string(),
                    };
                }
            },
            None => child.wait_with_output().await,
        };

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let status = if output.status.success() {
                    CommandStatus::Success
                } else {
                    CommandStatus::Failed {
                        code: output.status.code(),
                    }
                };
                CommandOutput {
                    status,
                    stdout,
                    stderr,
                }
            }
            Err(e) => CommandOutput {
                status: CommandStatus::Failed { code: None },
                stdout: String::new(),
                stderr: e.to_string(),
            },
        }
    }
}
