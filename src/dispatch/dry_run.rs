//! Dry-run dispatcher: logs what would be sent.

use async_trait::async_trait;
use tracing::info;

use super::{DispatchError, Dispatcher};
use crate::notification::Notification;

/// Used for `--dry-run` and when no notification command is configured.
pub struct DryRunDispatcher;

#[async_trait]
impl Dispatcher for DryRunDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        info!(
            contact = %notification.contact,
            file = %notification.file_name,
            message = %notification.message,
            "dry run: would send notification"
        );
        Ok(())
    }
}
