//! The watch loop.
//!
//! One cycle: poll the scanner for candidates, run each candidate through
//! the evaluation pipeline (name filters → age gate → stability check →
//! claim → dispatch), then sleep the poll interval. Candidates within a
//! cycle are evaluated concurrently — every candidate pays a stability
//! wait, and those waits must not serialize — sharing only the dedup
//! tracker, whose claim operation is atomic.
//!
//! Per-file errors never abort the cycle or the loop. On shutdown the
//! in-flight cycle is abandoned; cancelled evaluations release their
//! processing claims through the claim guard's drop, so no path is left
//! permanently orphaned in the processing state.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::{DispatchError, Dispatcher, RetryPolicy, dispatch_with_retry};
use crate::error::{DropwatchError, Result};
use crate::filter;
use crate::notification::Notification;
use crate::scanner::{Scanner, ScannerKind};
use crate::stability;
use crate::tracker::FileTracker;

/// Counters reported when the watcher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub cycles: u64,
    pub dispatched: u64,
    pub failed_passes: u64,
    pub ignored: u64,
}

/// Watches one root folder and drives qualifying files through the
/// dispatcher exactly once each.
pub struct FolderWatcher {
    config: Config,
    template: String,
    tracker: Arc<FileTracker>,
    dispatcher: Arc<dyn Dispatcher>,
    stats: Mutex<WatchStats>,
}

impl FolderWatcher {
    pub fn new(config: Config, dispatcher: Arc<dyn Dispatcher>) -> Result<Self> {
        let template = crate::notification::load_template(config.template_path.as_deref())?;
        let tracker = Arc::new(FileTracker::new(config.max_failures));
        Ok(Self {
            config,
            template,
            tracker,
            dispatcher,
            stats: Mutex::new(WatchStats::default()),
        })
    }

    /// The dedup tracker backing this watcher.
    pub fn tracker(&self) -> &Arc<FileTracker> {
        &self.tracker
    }

    pub fn stats(&self) -> WatchStats {
        *self.stats.lock()
    }

    /// Create the watched root if missing. Failing to create it is a
    /// startup error; the process reports it and exits instead of
    /// spinning on a root that can never exist.
    pub fn prepare_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.root).map_err(|e| {
            DropwatchError::Config(format!(
                "cannot create watched root {}: {e}",
                self.config.root.display()
            ))
        })
    }

    /// Run until Ctrl-C.
    pub async fn run(&self) -> Result<WatchStats> {
        self.prepare_root()?;
        let scanner = ScannerKind::from_config(&self.config)?;
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(scanner, shutdown).await
    }

    /// Run scan cycles until `shutdown` completes. A cycle in flight when
    /// the signal arrives is abandoned; claim guards release any claimed
    /// paths.
    pub async fn run_until(
        &self,
        mut scanner: ScannerKind,
        shutdown: impl Future<Output = ()>,
    ) -> Result<WatchStats> {
        info!(root = %self.config.root.display(), "watching folder");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.run_cycle(&mut scanner) => {}
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        let stats = self.stats();
        let summary = self.tracker.summary();
        info!(
            cycles = stats.cycles,
            dispatched = stats.dispatched,
            failed_passes = stats.failed_passes,
            ignored = summary.ignored,
            terminally_failed = summary.failed,
            "watcher stopped"
        );
        Ok(stats)
    }

    /// Evaluate one batch of candidates.
    pub async fn run_cycle(&self, scanner: &mut ScannerKind) {
        let batch = match scanner.poll() {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "scan failed, skipping cycle");
                return;
            }
        };
        self.stats.lock().cycles += 1;

        let eligible: Vec<PathBuf> = batch
            .into_iter()
            .filter(|path| self.tracker.should_process(path))
            .collect();
        if eligible.is_empty() {
            return;
        }
        debug!(candidates = eligible.len(), "evaluating candidates");

        join_all(eligible.into_iter().map(|path| self.evaluate(path))).await;
    }

    /// The per-candidate pipeline. Self-contained: any outcome here is
    /// recorded against this file only.
    async fn evaluate(&self, path: PathBuf) {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return,
        };

        if filter::is_temporary(&file_name) {
            if self.tracker.mark_ignored(&path) {
                self.stats.lock().ignored += 1;
                debug!(file = %file_name, "ignoring temporary file");
            }
            return;
        }

        if !filter::extension_allowed(&path, &self.config.extensions) {
            if self.tracker.mark_ignored(&path) {
                self.stats.lock().ignored += 1;
                debug!(file = %file_name, "ignoring file with filtered extension");
            }
            return;
        }

        if self.config.subfolders_only && path.parent() == Some(self.config.root.as_path()) {
            if self.tracker.mark_ignored(&path) {
                self.stats.lock().ignored += 1;
                debug!(file = %file_name, "ignoring file directly in watched root");
            }
            return;
        }

        if let Some(max_age) = self.config.max_file_age() {
            match file_age(&path).await {
                Some(age) if age > max_age => {
                    if self.tracker.mark_ignored(&path) {
                        self.stats.lock().ignored += 1;
                        debug!(file = %file_name, age_secs = age.as_secs(), "ignoring old file");
                    }
                    return;
                }
                Some(_) => {}
                // transient probe failure: re-evaluate next cycle
                None => return,
            }
        }

        if !stability::is_stable(&path, self.config.stability_wait()).await {
            debug!(file = %file_name, "file not stable yet");
            return;
        }

        // Atomic with the should-process re-check: a concurrent cycle
        // that won the race leaves us with nothing to do.
        let Some(claim) = self.tracker.claim(&path) else {
            return;
        };

        let notification = Notification::build(
            &path,
            &self.config.root,
            &self.template,
            &self.config.default_contact,
        );
        info!(file = %file_name, contact = %notification.contact, "dispatching notification");

        let policy = RetryPolicy {
            attempts: self.config.retry_attempts,
            delay: self.config.retry_delay(),
        };
        match dispatch_with_retry(self.dispatcher.as_ref(), &notification, &policy).await {
            Ok(()) => {
                claim.succeed();
                self.stats.lock().dispatched += 1;
                info!(file = %file_name, "notification sent");
            }
            Err(DispatchError::Fatal(message)) => {
                claim.fail_permanently();
                self.stats.lock().failed_passes += 1;
                error!(file = %file_name, error = %message, "giving up on file, failure is permanent");
            }
            Err(DispatchError::Retryable(message)) => {
                let outcome = claim.fail();
                self.stats.lock().failed_passes += 1;
                if outcome.terminal {
                    error!(
                        file = %file_name,
                        attempts = outcome.attempts,
                        error = %message,
                        "giving up on file after repeated failures"
                    );
                } else {
                    warn!(
                        file = %file_name,
                        attempts = outcome.attempts,
                        error = %message,
                        "processing failed, will retry on a later cycle"
                    );
                }
            }
        }
    }
}

async fn file_age(path: &std::path::Path) -> Option<std::time::Duration> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}
