//! Source tree inventory
//!
//! Enumerates a source tree into the flat entry list a selection
//! front-end consumes: every directory and file with its relative path
//! and size, plus aggregate totals.

use crate::types::{rel_of, Entry, RespaldoError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

/// Callback for reporting scan progress.
///
/// Arguments:
/// - `files_scanned`: total number of files scanned so far
/// - `bytes_scanned`: total bytes scanned so far
pub type ScanProgress = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Result of scanning a source tree.
#[derive(Debug, Clone)]
pub struct SourceInventory {
    /// Directories and files in traversal order (directories precede
    /// their contents), excluding the root itself.
    pub entries: Vec<Entry>,

    /// Aggregate statistics
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl SourceInventory {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan `root` and build a [`SourceInventory`].
///
/// Exclude patterns are gitignore-style globs applied relative to the
/// root. Unreadable entries are logged and skipped; only an invalid
/// exclude pattern or an unreadable root fails the scan.
pub fn scan_source(
    root: &Path,
    excludes: &[String],
    on_progress: Option<&ScanProgress>,
) -> Result<SourceInventory, RespaldoError> {
    let start_time = Instant::now();

    let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
    for pattern in excludes {
        // The ignore crate's OverrideBuilder uses ! for exclusion.
        let exclude_pattern = format!("!{}", pattern);
        override_builder.add(&exclude_pattern).map_err(|e| {
            RespaldoError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder.build().map_err(|e| {
        RespaldoError::Config(format!("Failed to build exclude overrides: {}", e))
    })?;

    if !root.is_dir() {
        return Err(RespaldoError::Validation(format!(
            "Source root is not a readable directory: {}",
            root.display()
        )));
    }

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .overrides(overrides)
        .sort_by_file_name(std::ffi::OsStr::cmp)
        .build();

    let mut entries = Vec::new();
    let mut total_size = 0u64;
    let mut total_files = 0usize;
    let mut total_dirs = 0usize;

    for result in walker {
        let item = match result {
            Ok(item) => item,
            Err(err) => {
                warn!(error = %err, "error during source scan, continuing");
                continue;
            }
        };

        let rel = match rel_of(root, item.path()) {
            Some(rel) if !rel.is_empty() => rel,
            _ => continue, // the root itself, or a path outside it
        };

        let file_type = match item.file_type() {
            Some(file_type) => file_type,
            None => continue,
        };

        if file_type.is_dir() {
            total_dirs += 1;
            entries.push(Entry::directory(rel));
            continue;
        }

        if !file_type.is_file() {
            // Skip symlinks and special files in the inventory.
            continue;
        }

        let size = match item.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!(path = %item.path().display(), error = %err, "skipping file with unreadable metadata");
                continue;
            }
        };

        total_files += 1;
        total_size += size;
        entries.push(Entry::file(rel, size));

        if let Some(callback) = on_progress {
            callback(total_files as u64, total_size);
        }
    }

    Ok(SourceInventory {
        entries,
        total_size,
        total_files,
        total_dirs,
        scan_duration: start_time.elapsed(),
        root_path: root.to_path_buf(),
    })
}
