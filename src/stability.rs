//! Stable-file detection.
//!
//! A file counts as stable when its size has not changed across two
//! probes separated by a short wait and the size is non-zero — the writer
//! is assumed to have finished. Files that vanish or cannot be probed are
//! simply not stable yet; a later scan cycle re-evaluates them.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

/// Probe the file size twice, `wait` apart.
///
/// Returns `true` only if the file exists at both probes, is a regular
/// file, the sizes match, and the size is non-zero. All I/O errors
/// (locked file, permission, vanished mid-wait) yield `false`, never an
/// error — transient conditions must not escalate.
pub async fn is_stable(path: &Path, wait: Duration) -> bool {
    let initial = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "stability probe failed");
            return false;
        }
    };

    tokio::time::sleep(wait).await;

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            let len = meta.len();
            len == initial && len > 0
        }
        Ok(_) => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "file vanished during stability wait");
            false
        }
    }
}
