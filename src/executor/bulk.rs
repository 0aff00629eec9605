//! Bulk copy strategy - delegate the transfer to an external mirroring
//! utility
//!
//! The utility receives the source and destination roots, flags for
//! recursive descent, system-artifact exclusion, optional multi-threaded
//! transfer and post-copy verification, and an inclusion-list file with
//! one selected relative path per line in the tool's native separator
//! convention. Its line-oriented output is streamed to the caller; its
//! exit-code convention (low codes = success family, high codes =
//! failure family) decides the outcome.

use crate::config::Config;
use crate::executor::{CopyCallback, CopyEvent, StrategyKind};
use crate::types::{RespaldoError, Selection, TransferLedger};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Exit codes at or above this value indicate failure; everything below
/// (no changes, files copied, extras detected) is the success family.
const FAILURE_EXIT_THRESHOLD: i32 = 8;

/// How many trailing output lines become the failure diagnostic.
const DIAGNOSTIC_TAIL: usize = 10;

/// Run the bulk strategy.
///
/// On success the ledger is seeded from the precomputed delta list: the
/// tool does not report structured per-file outcomes, so the delta is
/// taken as what was written.
pub(crate) fn run(
    config: &Config,
    selection: Option<&Selection>,
    delta: &[crate::types::Entry],
    on_event: Option<&CopyCallback<'_>>,
) -> Result<TransferLedger, RespaldoError> {
    if let Some(callback) = on_event {
        callback(&CopyEvent::Started {
            strategy: StrategyKind::Bulk,
            total: delta.len(),
        });
    }

    let include_list = match selection {
        Some(selection) => Some(write_include_list(selection)?),
        None => None,
    };

    let result = invoke_tool(config, include_list.as_deref(), on_event);

    if let Some(path) = include_list {
        if let Err(err) = fs::remove_file(&path) {
            debug!(path = %path.display(), error = %err, "could not remove inclusion list");
        }
    }

    result?;
    Ok(TransferLedger::from_delta(delta))
}

fn invoke_tool(
    config: &Config,
    include_list: Option<&Path>,
    on_event: Option<&CopyCallback<'_>>,
) -> Result<(), RespaldoError> {
    let mut command = build_command(config, include_list);

    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| RespaldoError::BulkUnavailable {
            tool: config.bulk_tool.clone(),
            reason: err.to_string(),
        })?;

    let mut log: Vec<String> = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "error reading bulk tool output");
                    break;
                }
            };
            if let Some(callback) = on_event {
                callback(&CopyEvent::BulkOutput { line: line.clone() });
            }
            log.push(line);
        }
    }

    if let Some(mut stderr) = child.stderr.take() {
        let mut buffer = String::new();
        if stderr.read_to_string(&mut buffer).is_ok() {
            log.extend(buffer.lines().map(str::to_string));
        }
    }

    let status = child.wait()?;
    // A termination without an exit code (signal) counts as failure.
    let code = status.code().unwrap_or(FAILURE_EXIT_THRESHOLD);

    if exit_indicates_failure(code) {
        return Err(RespaldoError::BulkFailed {
            code,
            diagnostic: diagnostic_tail(&log),
        });
    }

    debug!(code, lines = log.len(), "bulk tool finished");
    Ok(())
}

/// Build the tool invocation with direct process arguments; nothing is
/// passed through a shell.
fn build_command(config: &Config, include_list: Option<&Path>) -> Command {
    let mut command = Command::new(&config.bulk_tool);
    command.arg(&config.source).arg(&config.destination);

    // Recursive descent including empty directories.
    command.arg("/E");
    // Exclude hidden/system attributes and recycle/volume artifacts.
    command.arg("/XA:SH");
    command
        .arg("/XD")
        .arg("$RECYCLE.BIN")
        .arg("System Volume Information");

    if config.threads > 1 {
        command.arg(format!("/MT:{}", config.threads));
    }
    if config.verify {
        command.arg("/V");
    }
    if let Some(path) = include_list {
        command.arg("/IF").arg(format!("@{}", path.display()));
    }

    command
}

/// Write the selection as an inclusion-list file, one path per line in
/// the tool's separator convention. The file lands in the system temp
/// directory and is removed after the run.
fn write_include_list(selection: &Selection) -> Result<PathBuf, RespaldoError> {
    let path = std::env::temp_dir().join(format!("respaldo-include-{}.txt", std::process::id()));
    let mut file = fs::File::create(&path)?;
    for rel in selection.iter() {
        writeln!(file, "{}", to_tool_separators(rel))?;
    }
    Ok(path)
}

/// Convert a slash-separated relative path to the tool's backslash
/// convention.
fn to_tool_separators(rel: &str) -> String {
    rel.replace('/', "\\")
}

fn exit_indicates_failure(code: i32) -> bool {
    code >= FAILURE_EXIT_THRESHOLD
}

fn diagnostic_tail(log: &[String]) -> String {
    if log.is_empty() {
        return "no output captured".to_string();
    }
    let start = log.len().saturating_sub(DIAGNOSTIC_TAIL);
    log[start..].join("\n")
}
