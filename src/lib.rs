pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod notification;
pub mod scanner;
pub mod stability;
pub mod tracker;
pub mod watcher;

pub use config::{Config, DispatchConfig, ScannerMode};
pub use dispatch::{
    CommandDispatcher, DispatchError, Dispatcher, DryRunDispatcher, RetryPolicy,
    dispatch_with_retry,
};
pub use error::{DropwatchError, Result};
pub use notification::{DEFAULT_TEMPLATE, Notification};
pub use scanner::{EventScanner, PollScanner, Scanner, ScannerKind};
pub use tracker::{FailOutcome, FileState, FileTracker, ProcessingClaim, TrackerSummary};
pub use watcher::{FolderWatcher, WatchStats};
