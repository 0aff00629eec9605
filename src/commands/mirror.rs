//! Mirror command - the full analyze/copy/report pipeline
//!
//! Analysis and copy each run on a dedicated worker thread; progress
//! flows back over channels so the driving terminal stays responsive.
//! Every failure is converted into a `(success, diagnostic)` outcome at
//! this boundary; nothing panics or propagates across it.

use crate::config::Config;
use crate::executor::{execute_copy, CopyEvent};
use crate::notify::Notifier;
use crate::report::{write_report, ReportPaths, SizeBracket};
use crate::scanner::{compute_delta, total_size, AnalysisProgress};
use crate::types::{DeltaList, TransferLedger};
use crate::ui::ProgressReporter;
use indicatif::HumanBytes;
use std::sync::mpsc;
use std::thread;
use tracing::warn;

/// Result of one mirror run, reported across the component boundary.
#[derive(Debug)]
pub struct MirrorOutcome {
    /// Whether the operation as a whole succeeded.
    pub success: bool,

    /// Human-readable failure description when `success` is false.
    pub diagnostic: Option<String>,

    /// What was actually written.
    pub ledger: TransferLedger,

    /// Report artifacts, when a report was produced.
    pub report: Option<ReportPaths>,
}

impl MirrorOutcome {
    fn failed(diagnostic: String) -> Self {
        Self {
            success: false,
            diagnostic: Some(diagnostic),
            ledger: TransferLedger::new(),
            report: None,
        }
    }

    fn clean(ledger: TransferLedger, report: Option<ReportPaths>) -> Self {
        Self {
            success: true,
            diagnostic: None,
            ledger,
            report,
        }
    }
}

/// Progress messages bridged from worker callbacks onto the channel the
/// driving thread drains.
enum ProgressMsg {
    Started { total: usize },
    Item { index: usize, path: String },
    Bulk { line: String },
    Fallback { reason: String },
}

/// Run the mirror operation described by `config`.
pub fn run(config: Config, notifier: &dyn Notifier) -> MirrorOutcome {
    if let Err(err) = config.validate() {
        return MirrorOutcome::failed(err.to_string());
    }

    let reporter = ProgressReporter::new();
    reporter.start_analysis();

    let delta = match analyze(&config, &reporter) {
        Ok(delta) => delta,
        Err(diagnostic) => return MirrorOutcome::failed(diagnostic),
    };

    let delta_bytes: u64 = delta.iter().filter(|e| e.is_file()).map(|e| e.size).sum();
    reporter.finish_analysis(delta.len(), delta_bytes);
    println!("{}", format_delta_preview(&delta));

    if delta.is_empty() {
        println!("Nothing to copy: destination is up to date.");
        return MirrorOutcome::clean(TransferLedger::new(), None);
    }

    if config.dry_run {
        println!("{}", format_dry_run(&delta));
        println!("Dry-run mode: no changes were made.");
        return MirrorOutcome::clean(TransferLedger::new(), None);
    }

    let before = total_size(&config.destination);

    let outcome = match copy(&config, &delta, &reporter) {
        Ok(outcome) => outcome,
        Err(diagnostic) => return MirrorOutcome::failed(diagnostic),
    };

    let after = total_size(&config.destination);
    reporter.finish_copy(
        outcome.ledger.file_count(),
        outcome.ledger.directory_count(),
        outcome.ledger.total_bytes(),
    );

    if !outcome.success {
        return MirrorOutcome {
            success: false,
            diagnostic: outcome.diagnostic,
            ledger: outcome.ledger,
            report: None,
        };
    }

    let bracket = SizeBracket { before, after };
    let mut report = None;

    if config.write_report {
        match write_report(
            &config.report_dir,
            &config.source,
            &config.destination,
            &outcome.ledger,
            &bracket,
        ) {
            Ok(paths) => {
                println!("Report written: {}", paths.html.display());
                if config.notify {
                    let sent = notifier.notify(&paths.html, &config.source, &config.destination);
                    if sent.success {
                        println!("{}", sent.message);
                    } else {
                        // A failed hand-off does not undo a finished copy.
                        warn!(message = %sent.message, "notification failed");
                        println!("Notification failed: {}", sent.message);
                    }
                }
                report = Some(paths);
            }
            Err(err) => {
                return MirrorOutcome {
                    success: false,
                    diagnostic: Some(format!(
                        "Copy finished but the report could not be written: {err}"
                    )),
                    ledger: outcome.ledger,
                    report: None,
                };
            }
        }
    }

    println!("{}", format_completion(&outcome.ledger, &bracket));
    MirrorOutcome::clean(outcome.ledger, report)
}

/// Compute the delta on a worker thread, feeding the analysis spinner
/// from this thread until the worker's progress channel closes.
fn analyze(config: &Config, reporter: &ProgressReporter) -> Result<DeltaList, String> {
    let (tx, rx) = mpsc::channel::<(u64, u64)>();
    let worker = {
        let source = config.source.clone();
        let destination = config.destination.clone();
        let selection = config.selection.clone();
        thread::spawn(move || {
            let progress: AnalysisProgress = Box::new(move |examined, flagged| {
                let _ = tx.send((examined, flagged));
            });
            compute_delta(&source, &destination, selection.as_ref(), Some(&progress))
        })
    };

    for (examined, flagged) in rx {
        reporter.update_analysis(examined, flagged);
    }

    match worker.join() {
        Ok(Ok(delta)) => Ok(delta),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err("analysis worker terminated abnormally".to_string()),
    }
}

/// Execute the copy on a worker thread, bridging executor events onto a
/// channel drained here.
fn copy(
    config: &Config,
    delta: &[crate::types::Entry],
    reporter: &ProgressReporter,
) -> Result<crate::executor::CopyOutcome, String> {
    let (tx, rx) = mpsc::channel::<ProgressMsg>();
    let worker = {
        let config = config.clone();
        let delta = delta.to_vec();
        thread::spawn(move || {
            let callback = move |event: &CopyEvent| {
                let msg = match event {
                    CopyEvent::Started { total, .. } => ProgressMsg::Started { total: *total },
                    CopyEvent::Item { index, path, .. } => ProgressMsg::Item {
                        index: *index,
                        path: path.clone(),
                    },
                    CopyEvent::BulkOutput { line } => ProgressMsg::Bulk { line: line.clone() },
                    CopyEvent::FallingBack { reason } => ProgressMsg::Fallback {
                        reason: reason.clone(),
                    },
                };
                let _ = tx.send(msg);
            };
            execute_copy(&config, config.selection.as_ref(), &delta, Some(&callback))
        })
    };

    for msg in rx {
        match msg {
            ProgressMsg::Started { total } => reporter.start_copy(total as u64),
            ProgressMsg::Item { index, path } => reporter.copy_item((index + 1) as u64, &path),
            ProgressMsg::Bulk { line } => reporter.bulk_line(&line),
            ProgressMsg::Fallback { reason } => reporter.falling_back(&reason),
        }
    }

    worker
        .join()
        .map_err(|_| "copy worker terminated abnormally".to_string())
}

fn format_delta_preview(delta: &[crate::types::Entry]) -> String {
    let files = delta.iter().filter(|e| e.is_file()).count();
    let dirs = delta.len() - files;
    let bytes: u64 = delta.iter().filter(|e| e.is_file()).map(|e| e.size).sum();
    format!(
        "Delta: {} file(s), {} director(ies) | {} to copy",
        files,
        dirs,
        HumanBytes(bytes)
    )
}

fn format_dry_run(delta: &[crate::types::Entry]) -> String {
    let mut lines = Vec::with_capacity(delta.len() + 1);
    lines.push("Planned copies:".to_string());
    for entry in delta {
        if entry.is_file() {
            lines.push(format!("  COPY   {} ({})", entry.path, HumanBytes(entry.size)));
        } else {
            lines.push(format!("  MKDIR  {}", entry.path));
        }
    }
    lines.join("\n")
}

fn format_completion(ledger: &TransferLedger, bracket: &SizeBracket) -> String {
    format!(
        "Copied {} file(s) and {} director(ies) ({}). Destination: {} -> {}",
        ledger.file_count(),
        ledger.directory_count(),
        HumanBytes(ledger.total_bytes()),
        HumanBytes(bracket.before),
        HumanBytes(bracket.after)
    )
}
