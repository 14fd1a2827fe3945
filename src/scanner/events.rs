//! Event-driven scanner: OS filesystem notifications via `notify`.
//!
//! The `notify` callback runs on its own thread and bridges events into a
//! bounded channel that `poll()` drains. Both creation and modification
//! events are forwarded — large files fire a stream of modification
//! events while being written, and a creation event may arrive before any
//! content is flushed, so neither can be ignored. When the channel fills
//! up, the callback flips a rescan flag instead of dropping events
//! silently; the next poll coalesces into a full directory walk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::{Scanner, walk_files};
use crate::error::{DropwatchError, Result};

/// Capacity of the channel bridging the `notify` callback thread to
/// `poll()`. Overflow flips the rescan flag.
const CHANNEL_CAPACITY: usize = 512;

pub struct EventScanner {
    root: PathBuf,
    recursive: bool,
    rx: Receiver<PathBuf>,
    rescan_needed: Arc<AtomicBool>,
    primed: bool,
    /// Keep-alive handle: dropping the `RecommendedWatcher` deregisters
    /// the OS file-watch and stops all event delivery.
    _watcher: RecommendedWatcher,
}

impl EventScanner {
    /// Register the OS watch on `root`. The root must exist; the watch
    /// loop creates it before constructing the scanner.
    pub fn start(root: &Path, recursive: bool) -> Result<Self> {
        let (tx, rx) = sync_channel::<PathBuf>(CHANNEL_CAPACITY);
        let rescan_needed = Arc::new(AtomicBool::new(false));

        let callback_rescan = Arc::clone(&rescan_needed);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => forward_event(&event, &tx, &callback_rescan),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| DropwatchError::Watcher(format!("failed to create filesystem watcher: {e}")))?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode).map_err(|e| {
            DropwatchError::Watcher(format!("failed to watch {}: {e}", root.display()))
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            recursive,
            rx,
            rescan_needed,
            primed: false,
            _watcher: watcher,
        })
    }

    fn full_walk(&self) -> BTreeSet<PathBuf> {
        match walk_files(&self.root, self.recursive) {
            Ok(files) => files,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "cannot list watched root, skipping cycle");
                BTreeSet::new()
            }
        }
    }
}

impl Scanner for EventScanner {
    fn poll(&mut self) -> Result<BTreeSet<PathBuf>> {
        // First poll inventories files that existed before the watch was
        // registered; events only cover what changes afterwards.
        if !self.primed {
            self.primed = true;
            while self.rx.try_recv().is_ok() {}
            return Ok(self.full_walk());
        }

        if self.rescan_needed.swap(false, Ordering::Relaxed) {
            debug!("event channel overflowed, performing full rescan");
            while self.rx.try_recv().is_ok() {}
            return Ok(self.full_walk());
        }

        let mut batch = BTreeSet::new();
        while let Ok(path) = self.rx.try_recv() {
            // Events may reference directories or files already gone;
            // only current regular files are candidates.
            if path.is_file() {
                batch.insert(path);
            }
        }
        Ok(batch)
    }
}

fn forward_event(event: &Event, tx: &SyncSender<PathBuf>, rescan: &Arc<AtomicBool>) {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }
    for path in &event.paths {
        if tx.try_send(path.clone()).is_err() {
            if !rescan.swap(true, Ordering::Relaxed) {
                warn!(
                    capacity = CHANNEL_CAPACITY,
                    "watcher channel full, coalescing into full rescan"
                );
            }
            return;
        }
    }
}
