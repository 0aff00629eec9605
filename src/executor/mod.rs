//! Copy execution - strategies, fallback policy, and outcome reporting
//!
//! Two interchangeable strategies perform the transfer: delegating to an
//! external mirroring utility (bulk) or copying in-process (recursive).
//! The default policy tries bulk first and falls back to recursive; the
//! recursive strategy re-checks existence and size before every write,
//! so retrying after a failed bulk attempt is safe.

pub mod bulk;
pub mod recursive;

use crate::config::Config;
use crate::types::{Entry, Selection, TransferLedger};
use std::fmt;
use tracing::warn;

pub use recursive::copy_file_verified;

/// Copy strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Try the bulk tool, fall back to recursive on failure.
    #[default]
    Auto,
    /// External mirroring utility only.
    Bulk,
    /// In-process recursive copy only.
    Recursive,
}

/// The strategy that actually produced a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Bulk,
    Recursive,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Bulk => write!(f, "bulk"),
            StrategyKind::Recursive => write!(f, "recursive"),
        }
    }
}

/// Events emitted while a copy runs.
#[derive(Debug)]
pub enum CopyEvent {
    /// A strategy began processing.
    Started { strategy: StrategyKind, total: usize },
    /// One selected item is being processed (recursive strategy).
    Item {
        index: usize,
        total: usize,
        path: String,
    },
    /// One line of captured bulk-tool output.
    BulkOutput { line: String },
    /// The bulk attempt failed and the recursive strategy takes over.
    FallingBack { reason: String },
}

/// Optional callback used to receive copy events.
pub type CopyCallback<'a> = dyn Fn(&CopyEvent) + Send + Sync + 'a;

/// Result of one copy operation, reported across the component boundary.
///
/// No error escapes [`execute_copy`]; failures are converted into
/// `success = false` plus a displayable diagnostic.
#[derive(Debug)]
pub struct CopyOutcome {
    /// What was actually written.
    pub ledger: TransferLedger,

    /// Whether the operation as a whole succeeded.
    pub success: bool,

    /// Human-readable failure description when `success` is false.
    pub diagnostic: Option<String>,

    /// Strategy that produced the ledger, when one completed.
    pub strategy: Option<StrategyKind>,

    /// Whether the bulk attempt failed and recursive took over.
    pub fell_back: bool,
}

impl CopyOutcome {
    fn failed(diagnostic: String) -> Self {
        Self {
            ledger: TransferLedger::new(),
            success: false,
            diagnostic: Some(diagnostic),
            strategy: None,
            fell_back: false,
        }
    }
}

/// Execute the copy for an already-computed delta.
///
/// `selection` carries the caller's chosen subset (`None` = whole tree);
/// `delta` is the precomputed delta list, used to seed the ledger when
/// the bulk tool succeeds. Root preconditions are checked before any
/// work begins; an empty selection is rejected as a caller error.
pub fn execute_copy(
    config: &Config,
    selection: Option<&Selection>,
    delta: &[Entry],
    on_event: Option<&CopyCallback<'_>>,
) -> CopyOutcome {
    if !config.source.is_dir() {
        return CopyOutcome::failed(format!(
            "Source root is not an accessible directory: {}",
            config.source.display()
        ));
    }
    if !config.destination.is_dir() {
        return CopyOutcome::failed(format!(
            "Destination root is not an accessible directory: {}",
            config.destination.display()
        ));
    }
    if let Some(selection) = selection {
        if selection.is_empty() {
            return CopyOutcome::failed(
                "Selection is empty: nothing to copy (caller error)".to_string(),
            );
        }
    }

    let mut fell_back = false;
    let result = match config.strategy {
        Strategy::Recursive => recursive::run(&config.source, &config.destination, selection, on_event)
            .map(|ledger| (ledger, StrategyKind::Recursive)),
        Strategy::Bulk => bulk::run(config, selection, delta, on_event)
            .map(|ledger| (ledger, StrategyKind::Bulk)),
        Strategy::Auto => match bulk::run(config, selection, delta, on_event) {
            Ok(ledger) => Ok((ledger, StrategyKind::Bulk)),
            Err(err) => {
                warn!(error = %err, "bulk strategy failed, falling back to recursive copy");
                fell_back = true;
                if let Some(callback) = on_event {
                    callback(&CopyEvent::FallingBack {
                        reason: err.to_string(),
                    });
                }
                recursive::run(&config.source, &config.destination, selection, on_event)
                    .map(|ledger| (ledger, StrategyKind::Recursive))
            }
        },
    };

    match result {
        Ok((ledger, strategy)) => CopyOutcome {
            ledger,
            success: true,
            diagnostic: None,
            strategy: Some(strategy),
            fell_back,
        },
        Err(err) => CopyOutcome {
            ledger: TransferLedger::new(),
            success: false,
            diagnostic: Some(err.to_string()),
            strategy: None,
            fell_back,
        },
    }
}
