//! Notification boundary
//!
//! Transport of the finished report (mail, chat, whatever) lives outside
//! this crate. The driver only hands a notifier the report path plus the
//! roots involved and expects a success flag and a displayable message
//! back.

use std::path::Path;
use tracing::info;

/// Result handed back by a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub success: bool,
    pub message: String,
}

/// A consumer of finished reports.
pub trait Notifier {
    fn notify(&self, report: &Path, source: &Path, destination: &Path) -> NotifyOutcome;
}

/// Default notifier: records the report location in the log stream and
/// always succeeds.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &Path, source: &Path, destination: &Path) -> NotifyOutcome {
        info!(
            report = %report.display(),
            source = %source.display(),
            destination = %destination.display(),
            "run report ready"
        );
        NotifyOutcome {
            success: true,
            message: format!("Report ready: {}", report.display()),
        }
    }
}
