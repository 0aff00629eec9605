//! Core type definitions for respaldo

mod entry;
mod error;
mod ledger;
mod selection;

pub use entry::{depth_of, join_rel, rel_of, DeltaList, Entry, EntryKind};
pub use error::RespaldoError;
pub use ledger::TransferLedger;
pub use selection::Selection;
