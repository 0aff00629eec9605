//! Progress reporting

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for mirror operations
pub struct ProgressReporter {
    analysis_bar: ProgressBar,
    copy_bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let analysis_bar = ProgressBar::new_spinner();
        analysis_bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            analysis_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        let copy_bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} items | {msg}")
        {
            copy_bar.set_style(style.progress_chars("=>-"));
        }

        Self {
            analysis_bar,
            copy_bar,
        }
    }

    /// Mark start of the analysis phase.
    pub fn start_analysis(&self) {
        self.analysis_bar.set_message("Analyzing trees...");
    }

    /// Update analysis counters.
    pub fn update_analysis(&self, files_examined: u64, entries_flagged: u64) {
        self.analysis_bar.set_message(format!(
            "Analyzing trees... {} files compared | {} to copy",
            files_examined, entries_flagged
        ));
    }

    /// Mark completion of the analysis phase.
    pub fn finish_analysis(&self, entries_flagged: usize, bytes: u64) {
        self.analysis_bar.finish_with_message(format!(
            "Analysis complete: {} entries to copy | {}",
            entries_flagged,
            HumanBytes(bytes)
        ));
    }

    /// Initialize the copy phase.
    pub fn start_copy(&self, total_items: u64) {
        self.copy_bar.set_length(total_items);
        self.copy_bar.set_position(0);
        self.copy_bar.set_message("Starting copy...".to_string());
    }

    /// Record one processed item.
    pub fn copy_item(&self, index: u64, path: &str) {
        self.copy_bar.set_position(index);
        let display = if path.is_empty() { "." } else { path };
        self.copy_bar.set_message(format!("Copying {}", display));
    }

    /// Show one line of bulk tool output.
    pub fn bulk_line(&self, line: &str) {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            self.copy_bar.set_message(trimmed.to_string());
        }
    }

    /// Surface the bulk-to-recursive fallback.
    pub fn falling_back(&self, reason: &str) {
        self.copy_bar
            .println(format!("Bulk copy failed, retrying in-process: {}", reason));
    }

    /// Finalize the copy phase.
    pub fn finish_copy(&self, files: usize, dirs: usize, bytes: u64) {
        self.copy_bar.finish_with_message(format!(
            "Copy complete: {} files, {} directories | {}",
            files,
            dirs,
            HumanBytes(bytes)
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
