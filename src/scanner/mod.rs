//! Candidate discovery.
//!
//! Two interchangeable scanners produce the set of file paths currently
//! of interest under the watched root: [`PollScanner`] walks the tree on
//! every cycle, [`EventScanner`] listens for OS filesystem notifications
//! and falls back to a full walk when its event channel overflows. Both
//! sit behind the [`Scanner`] trait and are selected by configuration.

mod events;
mod poll;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use enum_dispatch::enum_dispatch;
use tracing::warn;

pub use events::EventScanner;
pub use poll::PollScanner;

use crate::config::{Config, ScannerMode};
use crate::error::Result;

/// A source of candidate file paths.
#[enum_dispatch]
pub trait Scanner {
    /// Produce the file paths currently of interest.
    ///
    /// A missing or unreadable root is not an error — the scanner logs
    /// and returns an empty set so the cycle is skipped, never aborted.
    fn poll(&mut self) -> Result<BTreeSet<PathBuf>>;
}

/// Configured scanner variant.
#[enum_dispatch(Scanner)]
pub enum ScannerKind {
    Poll(PollScanner),
    Events(EventScanner),
}

impl ScannerKind {
    /// Build the scanner selected by the configuration. The events
    /// variant registers an OS watch, so the root must exist.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.scanner {
            ScannerMode::Poll => PollScanner::new(&config.root, config.recursive).into(),
            ScannerMode::Events => EventScanner::start(&config.root, config.recursive)?.into(),
        })
    }
}

/// Walk the root and collect every regular file.
///
/// Unreadable subdirectories are logged and skipped; one bad directory
/// never hides the rest of the tree. Only the root itself being
/// unreadable surfaces as an error.
pub(crate) fn walk_files(
    root: &Path,
    recursive: bool,
) -> std::io::Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];
    let mut at_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if at_root => return Err(e),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        at_root = false;

        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {
                    if recursive {
                        pending.push(path);
                    }
                }
                Ok(file_type) if file_type.is_file() => {
                    files.insert(path);
                }
                // symlinks and other special entries are not candidates
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot stat directory entry");
                }
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_walk_collects_nested_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("top.pdf"), b"x").unwrap();
        let sub = tmp.path().join("acme");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("nested.pdf"), b"x").unwrap();

        let files = walk_files(tmp.path(), true).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&tmp.path().join("top.pdf")));
        assert!(files.contains(&sub.join("nested.pdf")));
    }

    #[test]
    fn test_walk_single_level_skips_subdirs() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("top.pdf"), b"x").unwrap();
        let sub = tmp.path().join("acme");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("nested.pdf"), b"x").unwrap();

        let files = walk_files(tmp.path(), false).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains(&tmp.path().join("top.pdf")));
    }

    #[test]
    fn test_walk_missing_root_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone");
        assert!(walk_files(&missing, true).is_err());
    }

    #[test]
    fn test_walk_excludes_directories_from_result() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("only_dirs")).unwrap();

        let files = walk_files(tmp.path(), true).unwrap();
        assert!(files.is_empty());
    }
}
