//! Directory size aggregation
//!
//! Rollups used for reporting: whole-tree byte totals and a bounded-depth
//! per-directory snapshot. Both tolerate unreadable entries by skipping
//! them; neither ever fails the whole call.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Snapshot depth used by reports: root plus two levels of nesting.
pub const SNAPSHOT_DEPTH: usize = 2;

/// Recursive sum of all readable file sizes under `root`.
///
/// Missing or unreadable entries contribute 0.
pub fn total_size(root: &Path) -> u64 {
    // Start below a zero max depth so no snapshot rows are recorded.
    let mut unused = BTreeMap::new();
    collect(root, "", 1, 0, &mut unused)
}

/// Per-directory recursive byte totals, bounded to `max_depth` levels of
/// nesting (the root is depth 0 and keyed as `"."`).
///
/// Every qualifying directory maps to the byte total of the full subtree
/// rooted there, so the root row equals [`total_size`].
pub fn size_snapshot(root: &Path, max_depth: usize) -> BTreeMap<String, u64> {
    let mut snapshot = BTreeMap::new();
    collect(root, "", 0, max_depth, &mut snapshot);
    snapshot
}

fn collect(
    dir: &Path,
    rel: &str,
    depth: usize,
    max_depth: usize,
    snapshot: &mut BTreeMap<String, u64>,
) -> u64 {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "skipping unreadable directory in size rollup");
            return 0;
        }
    };

    let mut total = 0u64;
    for item in read.flatten() {
        let path = item.path();
        let file_type = match item.file_type() {
            Ok(file_type) => file_type,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            let child_rel = if rel.is_empty() {
                item.file_name().to_string_lossy().into_owned()
            } else {
                format!("{rel}/{}", item.file_name().to_string_lossy())
            };
            total += collect(&path, &child_rel, depth + 1, max_depth, snapshot);
        } else if file_type.is_file() {
            match fs::metadata(&path) {
                Ok(meta) => total += meta.len(),
                Err(_) => continue,
            }
        }
        // Symlinks and special files are not counted.
    }

    if depth <= max_depth {
        let key = if rel.is_empty() { "." } else { rel };
        snapshot.insert(key.to_string(), total);
    }

    total
}
