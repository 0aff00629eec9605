//! Error types for respaldo

use std::path::PathBuf;
use thiserror::Error;

/// Error types for mirror operations
#[derive(Debug, Error)]
pub enum RespaldoError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (logic checks)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Post-copy verification found differing byte sizes
    #[error("Size mismatch after copying {path}: expected {expected} bytes, wrote {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The external mirroring utility could not be launched
    #[error("Bulk copy tool '{tool}' is not available: {reason}")]
    BulkUnavailable { tool: String, reason: String },

    /// The external mirroring utility reported a failure exit code
    #[error("Bulk copy tool failed (exit code {code}): {diagnostic}")]
    BulkFailed { code: i32, diagnostic: String },
}

impl RespaldoError {
    /// Whether this error came from the bulk strategy and should trigger
    /// fallback to the recursive strategy.
    pub fn is_strategy_failure(&self) -> bool {
        matches!(
            self,
            RespaldoError::BulkUnavailable { .. } | RespaldoError::BulkFailed { .. }
        )
    }

    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RespaldoError::Validation(_) | RespaldoError::Config(_)
        )
    }

    /// Per-item failures are logged and skipped; they never abort a
    /// multi-item operation.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            RespaldoError::SizeMismatch { .. } | RespaldoError::Io(_)
        )
    }
}
