//! Comparable filesystem metadata
//!
//! The delta check is content-blind: two files with identical size and
//! modification time are treated as unchanged even if their bytes differ.

use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Comparable identity of a filesystem object.
///
/// Recomputed on every comparison; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Byte size; directories report 0.
    pub size: u64,

    /// Last modification time.
    pub mtime: SystemTime,
}

impl Metadata {
    /// Whether two readings identify the same content: both size and
    /// mtime must match, either one differing fails the check.
    pub fn matches(&self, other: &Metadata) -> bool {
        self.size == other.size && self.mtime == other.mtime
    }
}

/// Read the comparable metadata of `path`.
///
/// Returns `None` when the object does not exist. Permission and symlink
/// anomalies are also reported as absent rather than escalated: a single
/// unreadable entry must never abort a tree comparison.
pub fn read_metadata(path: &Path) -> Option<Metadata> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %err, "metadata read failed, treating as absent");
            }
            return None;
        }
    };

    let mtime = match meta.modified() {
        Ok(mtime) => mtime,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "mtime unavailable, treating as absent");
            return None;
        }
    };

    let size = if meta.is_dir() { 0 } else { meta.len() };

    Some(Metadata { size, mtime })
}
