//! The dispatcher boundary.
//!
//! The core never talks to a messaging system itself; it hands each
//! qualifying file to a [`Dispatcher`] and interprets the result. Errors
//! are a value, not control flow, and carry whether a retry can help:
//! a crashed notification command is worth retrying, a command that does
//! not exist is not. [`dispatch_with_retry`] applies the configured
//! bounded-attempts-with-fixed-delay policy around a single processing
//! pass; it runs outside any tracker state, which stays claimed for the
//! whole pass.

mod command;
mod dry_run;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub use command::CommandDispatcher;
pub use dry_run::DryRunDispatcher;

use crate::notification::Notification;

/// Why a dispatch attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The attempt failed but a retry may succeed (non-zero exit,
    /// timeout, transient spawn error).
    #[error("dispatch failed: {0}")]
    Retryable(String),

    /// Retrying cannot help (e.g. the notification command is missing).
    #[error("dispatch failed permanently: {0}")]
    Fatal(String),
}

/// External collaborator that performs the user-facing notification.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Run one processing pass: up to `policy.attempts` dispatch calls with
/// `policy.delay` between them. A fatal error aborts the pass
/// immediately; otherwise the last retryable error is returned.
pub async fn dispatch_with_retry(
    dispatcher: &dyn Dispatcher,
    notification: &Notification,
    policy: &RetryPolicy,
) -> Result<(), DispatchError> {
    let mut last_error = DispatchError::Retryable("no dispatch attempts made".to_string());

    for attempt in 1..=policy.attempts.max(1) {
        match dispatcher.dispatch(notification).await {
            Ok(()) => return Ok(()),
            Err(fatal @ DispatchError::Fatal(_)) => return Err(fatal),
            Err(retryable) => {
                warn!(
                    file = %notification.file_name,
                    attempt,
                    attempts = policy.attempts,
                    error = %retryable,
                    "dispatch attempt failed"
                );
                last_error = retryable;
                if attempt < policy.attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(last_error)
}
