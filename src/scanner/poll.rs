//! Polling scanner: a full directory walk per cycle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{Scanner, walk_files};
use crate::error::Result;

/// Lists the watched root on every poll. Simple and robust; the dedup
/// tracker absorbs the repeated sightings of the same paths.
pub struct PollScanner {
    root: PathBuf,
    recursive: bool,
}

impl PollScanner {
    pub fn new(root: &Path, recursive: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive,
        }
    }
}

impl Scanner for PollScanner {
    fn poll(&mut self) -> Result<BTreeSet<PathBuf>> {
        match walk_files(&self.root, self.recursive) {
            Ok(files) => Ok(files),
            Err(e) => {
                // Root missing or unreadable: skip this cycle, keep running.
                warn!(root = %self.root.display(), error = %e, "cannot list watched root, skipping cycle");
                Ok(BTreeSet::new())
            }
        }
    }
}
