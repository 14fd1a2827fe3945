//! Dedup/state tracker: the authority for "has this file already been
//! handled, or is it currently being handled".
//!
//! Every path the watcher has resolved or is working on lives in a single
//! `DashMap`, so a path holds exactly one state at any time — it cannot
//! simultaneously be processing and processed. Claiming a path for
//! processing goes through the map's entry API, making the
//! should-process check atomic with the claim: two concurrent scan cycles
//! touching the same path can never both start an attempt.
//!
//! A successful claim hands back a [`ProcessingClaim`] guard. The guard
//! must be resolved with [`ProcessingClaim::succeed`] or
//! [`ProcessingClaim::fail`]; if it is instead dropped (dispatch future
//! cancelled on shutdown, or a panic unwinding through the dispatch
//! path), the path is released out of the processing state without
//! counting a failure, so a later cycle can retry it from scratch.
//!
//! Failure policy: each failed processing pass increments a per-path
//! attempt count. Once the count reaches the configured bound the path is
//! permanently failed and never offered to the dispatcher again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Lifecycle state of a tracked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// A notification attempt is in flight.
    Processing,
    /// The dispatcher reported success; terminal.
    Processed,
    /// Classified as a transient artifact or filtered by configuration;
    /// terminal.
    Ignored,
    /// One or more processing passes failed. Retryable while `attempts`
    /// is below the tracker's bound, terminal afterwards.
    Failed { attempts: u32 },
}

/// Counts of tracked paths by state, for shutdown reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSummary {
    pub processing: usize,
    pub processed: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Shared per-run tracking state. One instance per watched root.
#[derive(Debug)]
pub struct FileTracker {
    states: DashMap<PathBuf, FileState>,
    max_failures: u32,
}

impl FileTracker {
    /// `max_failures` is the number of failed processing passes after
    /// which a path is permanently given up on. Must be at least 1
    /// (enforced by config validation).
    pub fn new(max_failures: u32) -> Self {
        Self {
            states: DashMap::new(),
            max_failures,
        }
    }

    /// True iff the path is neither in flight nor terminally resolved.
    ///
    /// Advisory only — a racing cycle may claim the path between this
    /// check and [`FileTracker::claim`]. Use it to skip work cheaply; the
    /// claim itself re-checks atomically.
    pub fn should_process(&self, path: &Path) -> bool {
        match self.states.get(path).map(|entry| *entry.value()) {
            None => true,
            Some(FileState::Failed { attempts }) => attempts < self.max_failures,
            Some(_) => false,
        }
    }

    /// Atomically claim the path for processing.
    ///
    /// Returns `None` if the path is already processing, processed,
    /// ignored, or terminally failed. On success the path is in
    /// [`FileState::Processing`] until the returned guard resolves.
    pub fn claim(self: &Arc<Self>, path: &Path) -> Option<ProcessingClaim> {
        let prior_attempts = match self.states.entry(path.to_path_buf()) {
            Entry::Vacant(entry) => {
                entry.insert(FileState::Processing);
                0
            }
            Entry::Occupied(mut entry) => match *entry.get() {
                FileState::Failed { attempts } if attempts < self.max_failures => {
                    entry.insert(FileState::Processing);
                    attempts
                }
                _ => return None,
            },
        };

        Some(ProcessingClaim {
            tracker: Arc::clone(self),
            path: path.to_path_buf(),
            prior_attempts,
            resolved: false,
        })
    }

    /// Mark the path as permanently ignored. Idempotent, and never
    /// overwrites an existing state.
    ///
    /// Returns `true` if the path was newly ignored.
    pub fn mark_ignored(&self, path: &Path) -> bool {
        match self.states.entry(path.to_path_buf()) {
            Entry::Vacant(entry) => {
                entry.insert(FileState::Ignored);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Current state of a path, if tracked.
    pub fn state(&self, path: &Path) -> Option<FileState> {
        self.states.get(path).map(|entry| *entry.value())
    }

    /// Snapshot counts by state.
    pub fn summary(&self) -> TrackerSummary {
        let mut summary = TrackerSummary::default();
        for entry in self.states.iter() {
            match *entry.value() {
                FileState::Processing => summary.processing += 1,
                FileState::Processed => summary.processed += 1,
                FileState::Ignored => summary.ignored += 1,
                FileState::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    fn resolve(&self, path: &Path, state: FileState) {
        self.states.insert(path.to_path_buf(), state);
    }

    fn release(&self, path: &Path, prior_attempts: u32) {
        if prior_attempts == 0 {
            self.states.remove(path);
        } else {
            self.states.insert(
                path.to_path_buf(),
                FileState::Failed {
                    attempts: prior_attempts,
                },
            );
        }
    }
}

/// Outcome of [`ProcessingClaim::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailOutcome {
    /// Failed passes recorded for the path so far.
    pub attempts: u32,
    /// True when the attempt bound is reached and the path will not be
    /// retried.
    pub terminal: bool,
}

/// RAII guard for a path in [`FileState::Processing`].
///
/// Exactly one of `succeed`/`fail` should be called after the dispatcher
/// reports. Dropping the guard unresolved releases the path back out of
/// the processing state (restoring any prior failure count) so the next
/// cycle can retry it.
#[derive(Debug)]
pub struct ProcessingClaim {
    tracker: Arc<FileTracker>,
    path: PathBuf,
    prior_attempts: u32,
    resolved: bool,
}

impl ProcessingClaim {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record dispatcher success; the path is processed, terminally.
    pub fn succeed(mut self) {
        self.resolved = true;
        self.tracker.resolve(&self.path, FileState::Processed);
    }

    /// Record a failed processing pass. The path returns to a retryable
    /// failed state, or a terminal one once the bound is reached.
    pub fn fail(mut self) -> FailOutcome {
        self.resolved = true;
        let attempts = self.prior_attempts + 1;
        self.tracker
            .resolve(&self.path, FileState::Failed { attempts });
        FailOutcome {
            attempts,
            terminal: attempts >= self.tracker.max_failures,
        }
    }

    /// Record an unrecoverable failure regardless of the attempt count
    /// (e.g. the notification command does not exist).
    pub fn fail_permanently(mut self) -> FailOutcome {
        self.resolved = true;
        let attempts = (self.prior_attempts + 1).max(self.tracker.max_failures);
        self.tracker
            .resolve(&self.path, FileState::Failed { attempts });
        FailOutcome {
            attempts,
            terminal: true,
        }
    }
}

impl Drop for ProcessingClaim {
    fn drop(&mut self) {
        if !self.resolved {
            self.tracker.release(&self.path, self.prior_attempts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(max_failures: u32) -> Arc<FileTracker> {
        Arc::new(FileTracker::new(max_failures))
    }

    #[test]
    fn test_unseen_path_should_process() {
        let t = tracker(3);
        assert!(t.should_process(Path::new("/drop/a.pdf")));
    }

    #[test]
    fn test_claim_blocks_second_claim() {
        let t = tracker(3);
        let path = Path::new("/drop/a.pdf");

        let claim = t.claim(path).expect("first claim succeeds");
        assert!(!t.should_process(path));
        assert!(t.claim(path).is_none());
        assert_eq!(t.state(path), Some(FileState::Processing));

        claim.succeed();
        assert!(!t.should_process(path));
        assert!(t.claim(path).is_none());
        assert_eq!(t.state(path), Some(FileState::Processed));
    }

    #[test]
    fn test_failed_path_is_retryable_until_bound() {
        let t = tracker(2);
        let path = Path::new("/drop/a.pdf");

        let outcome = t.claim(path).unwrap().fail();
        assert_eq!(outcome, FailOutcome { attempts: 1, terminal: false });
        assert!(t.should_process(path));

        let outcome = t.claim(path).unwrap().fail();
        assert_eq!(outcome, FailOutcome { attempts: 2, terminal: true });
        assert!(!t.should_process(path));
        assert!(t.claim(path).is_none());
    }

    #[test]
    fn test_success_after_failure_is_terminal_success() {
        let t = tracker(3);
        let path = Path::new("/drop/a.pdf");

        t.claim(path).unwrap().fail();
        t.claim(path).unwrap().succeed();

        assert_eq!(t.state(path), Some(FileState::Processed));
        assert!(!t.should_process(path));
    }

    #[test]
    fn test_dropped_claim_releases_without_counting() {
        let t = tracker(3);
        let path = Path::new("/drop/a.pdf");

        {
            let _claim = t.claim(path).unwrap();
            // simulated cancellation: guard dropped unresolved
        }
        assert_eq!(t.state(path), None);
        assert!(t.should_process(path));

        // A dropped retry keeps the earlier failure count.
        t.claim(path).unwrap().fail();
        {
            let _claim = t.claim(path).unwrap();
        }
        assert_eq!(t.state(path), Some(FileState::Failed { attempts: 1 }));
        assert!(t.should_process(path));
    }

    #[test]
    fn test_fail_permanently_is_terminal() {
        let t = tracker(5);
        let path = Path::new("/drop/a.pdf");

        let outcome = t.claim(path).unwrap().fail_permanently();
        assert!(outcome.terminal);
        assert!(!t.should_process(path));
        assert!(t.claim(path).is_none());
    }

    #[test]
    fn test_mark_ignored_is_idempotent_and_sticky() {
        let t = tracker(3);
        let path = Path::new("/drop/~$lock.xlsx");

        assert!(t.mark_ignored(path));
        assert!(!t.mark_ignored(path));
        assert!(!t.should_process(path));
        assert!(t.claim(path).is_none());
        assert_eq!(t.state(path), Some(FileState::Ignored));
    }

    #[test]
    fn test_ignored_never_overwrites_processed() {
        let t = tracker(3);
        let path = Path::new("/drop/a.pdf");

        t.claim(path).unwrap().succeed();
        assert!(!t.mark_ignored(path));
        assert_eq!(t.state(path), Some(FileState::Processed));
    }

    #[test]
    fn test_concurrent_claims_yield_exactly_one_winner() {
        let t = tracker(3);
        let path = PathBuf::from("/drop/contended.pdf");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let t = Arc::clone(&t);
            let path = path.clone();
            handles.push(std::thread::spawn(move || t.claim(&path).is_some()));
        }

        let winners = handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1, "exactly one thread may claim a path");
    }

    #[test]
    fn test_summary_counts_states() {
        let t = tracker(1);
        t.claim(Path::new("/a")).unwrap().succeed();
        t.claim(Path::new("/b")).unwrap().fail();
        t.mark_ignored(Path::new("/c"));
        let _held = t.claim(Path::new("/d")).unwrap();

        let summary = t.summary();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.processing, 1);
    }
}
