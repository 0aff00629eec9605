//! List command - print the source inventory a selection is made from

use crate::config::ListArgs;
use crate::scanner::{scan_source, SourceInventory};
use crate::types::{depth_of, Entry, RespaldoError};
use console::style;
use indicatif::HumanBytes;

/// Enumerate the source tree and print one line per entry, indented by
/// nesting level, with per-file sizes and a total.
pub fn run(args: ListArgs) -> Result<(), RespaldoError> {
    let inventory = scan_source(&args.source, &args.exclude, None)?;
    print!("{}", format_inventory(&inventory));
    Ok(())
}

fn format_inventory(inventory: &SourceInventory) -> String {
    let mut out = String::new();
    for entry in &inventory.entries {
        out.push_str(&format_entry_line(entry));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} entries | {} files | {}\n",
        inventory.entries.len(),
        inventory.total_files,
        HumanBytes(inventory.total_size)
    ));
    out
}

fn format_entry_line(entry: &Entry) -> String {
    let indent = "  ".repeat(depth_of(&entry.path).saturating_sub(1));
    let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
    if entry.is_directory() {
        format!("{indent}{}/", style(name).cyan().bold())
    } else {
        format!("{indent}{name}  {}", style(HumanBytes(entry.size)).dim())
    }
}
