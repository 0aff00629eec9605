//! In-process recursive copy strategy
//!
//! Processes each selected entry directly: directories are mirrored and
//! their contents walked, files are copied with a post-write size check.
//! A failing item is logged and excluded from the ledger; its siblings
//! are still processed. Re-running is safe: existence and size are
//! re-checked before every write.

use crate::executor::{CopyCallback, CopyEvent, StrategyKind};
use crate::types::{join_rel, Entry, RespaldoError, Selection, TransferLedger};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Copy the selected subset of `source_root` into `dest_root`.
///
/// With `selection = None` the whole tree is treated as one selected
/// directory. Progress is reported per selected item; the returned
/// ledger records every entry actually written.
pub(crate) fn run(
    source_root: &Path,
    dest_root: &Path,
    selection: Option<&Selection>,
    on_event: Option<&CopyCallback<'_>>,
) -> Result<TransferLedger, RespaldoError> {
    let items: Vec<String> = match selection {
        Some(selection) => selection.iter().map(str::to_string).collect(),
        None => vec![String::new()],
    };
    let total = items.len();

    emit(
        on_event,
        CopyEvent::Started {
            strategy: StrategyKind::Recursive,
            total,
        },
    );

    let mut ledger = TransferLedger::new();

    for (index, item) in items.iter().enumerate() {
        emit(
            on_event,
            CopyEvent::Item {
                index,
                total,
                path: item.clone(),
            },
        );

        if let Err(err) = copy_item(source_root, dest_root, item, &mut ledger) {
            warn!(path = %item, error = %err, "copy failed, entry excluded from ledger");
        }
    }

    Ok(ledger)
}

fn copy_item(
    source_root: &Path,
    dest_root: &Path,
    rel: &str,
    ledger: &mut TransferLedger,
) -> Result<(), RespaldoError> {
    let source = join_rel(source_root, rel);
    let dest = join_rel(dest_root, rel);

    if source.is_dir() {
        copy_dir_tree(&source, &dest, rel, ledger)
    } else if source.is_file() {
        let size = copy_file_verified(&source, &dest)?;
        ledger.record(Entry::file(rel, size));
        Ok(())
    } else {
        Err(RespaldoError::Validation(format!(
            "selected entry no longer exists in source: {rel}"
        )))
    }
}

/// Mirror a directory and copy every changed file beneath it.
///
/// Directory creation is idempotent; only a directory actually created
/// here is recorded in the ledger. Per-file failures are logged and do
/// not abort siblings.
fn copy_dir_tree(
    source: &Path,
    dest: &Path,
    rel: &str,
    ledger: &mut TransferLedger,
) -> Result<(), RespaldoError> {
    if mirror_directory(dest)? && !rel.is_empty() {
        ledger.record(Entry::directory(rel));
    }

    let mut names: Vec<(String, bool)> = Vec::new();
    for item in fs::read_dir(source)? {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                warn!(path = %source.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let is_dir = item.file_type().map(|t| t.is_dir()).unwrap_or(false);
        names.push((item.file_name().to_string_lossy().into_owned(), is_dir));
    }
    names.sort();

    for (name, is_dir) in names {
        let child_rel = if rel.is_empty() {
            name.clone()
        } else {
            format!("{rel}/{name}")
        };
        let child_source = source.join(&name);
        let child_dest = dest.join(&name);

        if is_dir {
            if let Err(err) = copy_dir_tree(&child_source, &child_dest, &child_rel, ledger) {
                warn!(path = %child_rel, error = %err, "subdirectory copy failed, continuing");
            }
        } else if file_differs(&child_source, &child_dest) {
            match copy_file_verified(&child_source, &child_dest) {
                Ok(size) => ledger.record(Entry::file(&child_rel, size)),
                Err(err) => {
                    warn!(path = %child_rel, error = %err, "file copy failed, entry excluded from ledger");
                }
            }
        }
    }

    Ok(())
}

/// Create `dest` (and any missing parents) if needed; returns whether a
/// new directory was created.
fn mirror_directory(dest: &Path) -> Result<bool, RespaldoError> {
    if dest.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dest)?;
    Ok(true)
}

/// Whether the destination copy is absent or differs in byte size.
///
/// The copy-time check is size-only; a truncated file from an earlier
/// interrupted run is picked up here and rewritten in full.
fn file_differs(source: &Path, dest: &Path) -> bool {
    let source_len = match fs::metadata(source) {
        Ok(meta) => meta.len(),
        Err(_) => return true, // let the copy attempt surface the error
    };
    match fs::metadata(dest) {
        Ok(meta) => meta.len() != source_len,
        Err(_) => true,
    }
}

/// Copy one file and verify the written byte count.
///
/// Reads the full source content, writes it to the destination, then
/// compares resulting sizes; a mismatch is an error for this file. The
/// source modification time is carried over so an immediate re-analysis
/// sees the pair as unchanged.
pub fn copy_file_verified(source: &Path, dest: &Path) -> Result<u64, RespaldoError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = fs::read(source)?;
    fs::write(dest, &content)?;

    let written = fs::metadata(dest)?.len();
    if written != content.len() as u64 {
        return Err(RespaldoError::SizeMismatch {
            path: dest.to_path_buf(),
            expected: content.len() as u64,
            actual: written,
        });
    }

    let source_mtime = fs::metadata(source)?.modified()?;
    filetime::set_file_mtime(dest, FileTime::from_system_time(source_mtime))?;

    Ok(written)
}

fn emit(on_event: Option<&CopyCallback<'_>>, event: CopyEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}
