//! Entry - a single filesystem object tracked during analysis and copy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of filesystem entry tracked by the mirror engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file with a byte size.
    File,
    /// Directory; contributes size 0 to deltas and ledgers.
    Directory,
}

impl EntryKind {
    /// Human-readable label used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// A filesystem entry relative to a tree root.
///
/// `path` is slash-separated regardless of platform and relative to the
/// tree root; the empty string denotes the root itself. Identity within a
/// tree is the relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Relative path from the tree root, slash-separated.
    pub path: String,

    /// File or directory.
    pub kind: EntryKind,

    /// Byte size; always 0 for directories.
    pub size: u64,
}

impl Entry {
    /// Create a file entry.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    /// Create a directory entry (size fixed at 0).
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// An ordered list of entries that require copying.
pub type DeltaList = Vec<Entry>;

/// Join a slash-separated relative path onto a filesystem root.
///
/// Components are joined one by one so the result uses the platform's
/// separator. An empty relative path returns the root unchanged.
pub fn join_rel(root: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        return root.to_path_buf();
    }
    let mut out = root.to_path_buf();
    for component in rel.split('/') {
        out.push(component);
    }
    out
}

/// Compute the slash-normalized relative path of `path` under `root`.
///
/// Returns `None` when `path` is not beneath `root`. The root itself maps
/// to the empty string.
pub fn rel_of(root: &Path, path: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in stripped.components() {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    Some(parts.join("/"))
}

/// Nesting depth of a relative path: the root is depth 0, its direct
/// children depth 1, and so on.
pub fn depth_of(rel: &str) -> usize {
    if rel.is_empty() {
        0
    } else {
        rel.matches('/').count() + 1
    }
}
