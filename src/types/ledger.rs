//! TransferLedger - the record of entries actually written to destination

use super::{Entry, EntryKind};
use serde::{Deserialize, Serialize};

/// Append-only record of what one copy operation wrote.
///
/// The ledger never deduplicates: if the same relative path is recorded
/// twice, both records are kept. It is consumed read-only by the report
/// layer after the operation finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLedger {
    entries: Vec<Entry>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one transferred entry.
    pub fn record(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of recorded files.
    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .count()
    }

    /// Number of recorded directories.
    pub fn directory_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Directory)
            .count()
    }

    /// Total bytes across recorded file entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.size)
            .sum()
    }

    /// Seed the ledger from a precomputed delta list.
    ///
    /// Used by the bulk strategy, which does not report structured
    /// per-file outcomes; the delta is taken as what was written.
    pub fn from_delta(delta: &[Entry]) -> Self {
        Self {
            entries: delta.to_vec(),
        }
    }
}
