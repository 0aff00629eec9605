//! # respaldo - Selective Directory Mirroring
//!
//! Compare a chosen subset of a source tree against a destination tree,
//! copy only the delta, and record what was transferred in a verifiable
//! report.

// Module declarations
pub mod commands;
pub mod config;
pub mod executor;
pub mod logging;
pub mod notify;
pub mod report;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use executor::Strategy;
pub use types::{Entry, EntryKind, RespaldoError, Selection, TransferLedger};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
