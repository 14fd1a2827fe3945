//! The `watch` command: run the folder watcher until interrupted.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config;
use crate::dispatch::{CommandDispatcher, Dispatcher, DryRunDispatcher};
use crate::error::Result;
use crate::watcher::FolderWatcher;

pub async fn cmd_watch(
    config_path: Option<&Path>,
    root: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let config = config::resolve(config_path, root)?;

    let dispatcher: Arc<dyn Dispatcher> = if dry_run {
        info!("dry-run requested, notifications will only be logged");
        Arc::new(DryRunDispatcher)
    } else if let Some(dispatcher) = CommandDispatcher::from_config(&config) {
        Arc::new(dispatcher)
    } else {
        info!("no notification command configured, notifications will only be logged");
        Arc::new(DryRunDispatcher)
    };

    let watcher = FolderWatcher::new(config, dispatcher)?;
    let stats = watcher.run().await?;
    info!(
        dispatched = stats.dispatched,
        cycles = stats.cycles,
        "done"
    );
    Ok(())
}
