//! Dispatcher that runs an external notification command.
//!
//! The command receives the notification context as `DROPWATCH_*`
//! environment variables and signals the outcome through its exit status.
//! A command that overruns the timeout is killed and the attempt counts
//! as retryable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{DispatchError, Dispatcher};
use crate::config::Config;
use crate::notification::Notification;

pub struct CommandDispatcher {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from configuration. Returns `None` when no command is
    /// configured; the caller falls back to the dry-run dispatcher.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.dispatch.command.as_ref().map(|command| {
            Self::new(
                command.clone(),
                config.dispatch.args.clone(),
                config.dispatch_timeout(),
            )
        })
    }
}

#[async_trait]
impl Dispatcher for CommandDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // ensure the child dies with the timed-out future
            .kill_on_drop(true);
        for (key, value) in notification.env() {
            command.env(key, value);
        }

        debug!(program = %self.program, file = %notification.file_name, "running notification command");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(DispatchError::Retryable(format!(
                    "'{}' timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                )));
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DispatchError::Fatal(format!(
                    "notification command '{}' not found",
                    self.program
                )));
            }
            Ok(Err(e)) => {
                return Err(DispatchError::Retryable(format!(
                    "failed to run '{}': {e}",
                    self.program
                )));
            }
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(DispatchError::Retryable(format!(
            "'{}' exited with status {}: {}",
            self.program,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )))
    }
}
