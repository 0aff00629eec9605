//! Tree analysis - metadata, delta computation, size rollups, inventory

mod delta;
mod meta;
mod sizes;
mod walker;

pub use delta::{compute_delta, AnalysisProgress};
pub use meta::{read_metadata, Metadata};
pub use sizes::{size_snapshot, total_size, SNAPSHOT_DEPTH};
pub use walker::{scan_source, ScanProgress, SourceInventory};
