//! Run reports - HTML for humans, JSON sidecar for machines
//!
//! After a copy the driver hands this module the ledger plus the
//! destination size bracket; it renders a report with the copied
//! entries, totals, before/after sizes and depth-bounded size rollups
//! of both trees.

use crate::scanner::{size_snapshot, SNAPSHOT_DEPTH};
use crate::types::{RespaldoError, TransferLedger};
use chrono::Local;
use indicatif::HumanBytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination byte totals measured around the copy call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeBracket {
    pub before: u64,
    pub after: u64,
}

impl SizeBracket {
    /// Signed growth of the destination (after - before).
    pub fn difference(&self) -> i64 {
        self.after as i64 - self.before as i64
    }
}

/// Machine-readable summary written next to the HTML report.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: chrono::DateTime<Local>,
    pub source: String,
    pub destination: String,
    pub files_copied: usize,
    pub directories_created: usize,
    pub bytes_copied: u64,
    pub destination_before: u64,
    pub destination_after: u64,
    pub destination_difference: i64,
    pub entries: &'a [crate::types::Entry],
}

/// Paths of the written report artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub json: PathBuf,
}

/// Write the HTML report and its JSON sidecar into `report_dir`.
///
/// The filename carries the source directory name and a local
/// timestamp, e.g. `respaldo_report_photos_20260807_1430.html`.
pub fn write_report(
    report_dir: &Path,
    source: &Path,
    destination: &Path,
    ledger: &TransferLedger,
    bracket: &SizeBracket,
) -> Result<ReportPaths, RespaldoError> {
    fs::create_dir_all(report_dir)?;

    let now = Local::now();
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    let stem = format!(
        "respaldo_report_{}_{}",
        source_name,
        now.format("%Y%m%d_%H%M")
    );

    let source_sizes = size_snapshot(source, SNAPSHOT_DEPTH);
    let dest_sizes = size_snapshot(destination, SNAPSHOT_DEPTH);

    let html_path = report_dir.join(format!("{stem}.html"));
    let html = render_html(
        source,
        destination,
        ledger,
        bracket,
        &source_sizes,
        &dest_sizes,
        &now.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    fs::write(&html_path, html)?;

    let summary = RunSummary {
        generated_at: now,
        source: source.display().to_string(),
        destination: destination.display().to_string(),
        files_copied: ledger.file_count(),
        directories_created: ledger.directory_count(),
        bytes_copied: ledger.total_bytes(),
        destination_before: bracket.before,
        destination_after: bracket.after,
        destination_difference: bracket.difference(),
        entries: ledger.entries(),
    };
    let json_path = report_dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| RespaldoError::Validation(format!("Failed to serialize run summary: {e}")))?;
    fs::write(&json_path, json)?;

    Ok(ReportPaths {
        html: html_path,
        json: json_path,
    })
}

fn render_html(
    source: &Path,
    destination: &Path,
    ledger: &TransferLedger,
    bracket: &SizeBracket,
    source_sizes: &BTreeMap<String, u64>,
    dest_sizes: &BTreeMap<String, u64>,
    timestamp: &str,
) -> String {
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());

    let mut ledger_rows = String::new();
    for entry in ledger.iter() {
        ledger_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            entry.kind.label(),
            escape(&entry.path),
            HumanBytes(entry.size)
        ));
    }

    let difference = bracket.difference();
    let difference_display = if difference < 0 {
        format!("-{}", HumanBytes(difference.unsigned_abs()))
    } else {
        HumanBytes(difference as u64).to_string()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Copy Report - {name}</title>
<meta charset="UTF-8">
<style>
body {{ font-family: Arial, sans-serif; margin: 20px; }}
table {{ border-collapse: collapse; width: 100%; margin-bottom: 20px; }}
th, td {{ padding: 8px; text-align: left; border: 1px solid #ddd; }}
th {{ background-color: #f2f2f2; }}
tr:nth-child(even) {{ background-color: #f9f9f9; }}
h1, h2 {{ color: #333; }}
.summary {{ background-color: #e8f5e9; border: 1px solid #a5d6a7; padding: 15px; border-radius: 5px; margin: 20px 0; }}
.comparison {{ background-color: #e3f2fd; border: 1px solid #90caf9; padding: 15px; border-radius: 5px; margin: 20px 0; }}
.total {{ font-weight: bold; }}
</style>
</head>
<body>
<h1>Copy Report - {name} - {timestamp}</h1>
<div class="summary">
<h2>Summary</h2>
<p><span class="total">Source:</span> {source}</p>
<p><span class="total">Destination:</span> {destination}</p>
<p><span class="total">Files copied:</span> {files}</p>
<p><span class="total">Directories created:</span> {dirs}</p>
<p><span class="total">Bytes copied:</span> {bytes}</p>
</div>
<div class="comparison">
<h2>Destination size</h2>
<p><span class="total">Before:</span> {before}</p>
<p><span class="total">After:</span> {after}</p>
<p><span class="total">Difference:</span> {difference}</p>
</div>
<h2>Copied entries</h2>
<table>
<tr><th>Kind</th><th>Path</th><th>Size</th></tr>
{ledger_rows}<tr class="total"><td colspan="2">Total</td><td>{bytes}</td></tr>
</table>
<h2>Source tree sizes</h2>
{source_table}
<h2>Destination tree sizes</h2>
{dest_table}
</body>
</html>
"#,
        name = escape(&source_name),
        timestamp = timestamp,
        source = escape(&source.display().to_string()),
        destination = escape(&destination.display().to_string()),
        files = ledger.file_count(),
        dirs = ledger.directory_count(),
        bytes = HumanBytes(ledger.total_bytes()),
        before = HumanBytes(bracket.before),
        after = HumanBytes(bracket.after),
        difference = difference_display,
        ledger_rows = ledger_rows,
        source_table = render_size_table(source_sizes),
        dest_table = render_size_table(dest_sizes),
    )
}

fn render_size_table(sizes: &BTreeMap<String, u64>) -> String {
    let mut out = String::from("<table>\n<tr><th>Directory</th><th>Size</th></tr>\n");
    for (path, size) in sizes {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(path),
            HumanBytes(*size)
        ));
    }
    out.push_str("</table>");
    out
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
