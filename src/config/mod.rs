//! Configuration management
//!
//! CLI arguments convert into a validated [`Config`]; an optional TOML
//! file supplies defaults that CLI flags override. Root preconditions
//! are rejected here, before any work begins.

use crate::executor::Strategy;
use crate::types::{RespaldoError, Selection};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "respaldo",
    version,
    about = "Selective directory mirroring - copy only the delta, record what moved"
)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the source tree with per-entry sizes
    List(ListArgs),

    /// Mirror the selected subset of the source into the destination
    Mirror(MirrorArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Source directory to enumerate
    pub source: PathBuf,

    /// Exclude pattern (gitignore-style glob, repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MirrorArgs {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory (must exist)
    pub destination: PathBuf,

    /// Relative path to copy (repeatable); everything is copied when no
    /// selection is given
    #[arg(long = "select", value_name = "PATH")]
    pub select: Vec<String>,

    /// File with one selected relative path per line
    #[arg(long, value_name = "FILE")]
    pub select_from: Option<PathBuf>,

    /// Copy strategy
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// External mirroring utility used by the bulk strategy
    #[arg(long, value_name = "NAME")]
    pub bulk_tool: Option<String>,

    /// Worker threads requested from the bulk tool
    #[arg(long, value_name = "N")]
    pub threads: Option<u32>,

    /// Ask the bulk tool to verify copied files
    #[arg(long)]
    pub verify: bool,

    /// Show what would be copied without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Directory where the run report is written
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Skip report generation
    #[arg(long)]
    pub no_report: bool,

    /// Hand the finished report to the notification hook
    #[arg(long)]
    pub notify: bool,

    /// TOML file with default settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Defaults loadable from a TOML file; every field is optional and CLI
/// flags win.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub strategy: Option<Strategy>,
    pub bulk_tool: Option<String>,
    pub threads: Option<u32>,
    pub verify: Option<bool>,
    pub report_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, RespaldoError> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| RespaldoError::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Validated configuration for one mirror operation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory
    pub destination: PathBuf,

    /// Caller-chosen subset; `None` mirrors the whole tree
    pub selection: Option<Selection>,

    /// Copy strategy (default: bulk with recursive fallback)
    pub strategy: Strategy,

    /// External mirroring utility for the bulk strategy
    pub bulk_tool: String,

    /// Worker threads requested from the bulk tool
    pub threads: u32,

    /// Ask the bulk tool to verify copied files
    pub verify: bool,

    /// Show the delta without copying
    pub dry_run: bool,

    /// Where the report is written
    pub report_dir: PathBuf,

    /// Whether to write a report at all
    pub write_report: bool,

    /// Whether to hand the report to the notification hook
    pub notify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            selection: None,
            strategy: Strategy::default(),
            bulk_tool: "robocopy".to_string(),
            threads: 8,
            verify: false,
            dry_run: false,
            report_dir: PathBuf::from("."),
            write_report: true,
            notify: false,
        }
    }
}

impl Config {
    /// Validate root preconditions.
    pub fn validate(&self) -> Result<(), RespaldoError> {
        if !self.source.is_dir() {
            return Err(RespaldoError::Config(format!(
                "Source path does not exist or is not a directory: {}",
                self.source.display()
            )));
        }
        if !self.destination.is_dir() {
            return Err(RespaldoError::Config(format!(
                "Destination path does not exist or is not a directory: {}",
                self.destination.display()
            )));
        }
        if self.source == self.destination {
            return Err(RespaldoError::Config(
                "Source and destination cannot be the same".to_string(),
            ));
        }
        if let Some(selection) = &self.selection {
            if selection.is_empty() {
                return Err(RespaldoError::Validation(
                    "Selection is empty: nothing to do".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<MirrorArgs> for Config {
    type Error = RespaldoError;

    fn try_from(args: MirrorArgs) -> Result<Self, Self::Error> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let defaults = Config::default();

        let selection = build_selection(&args)?;

        let config = Config {
            source: args.source,
            destination: args.destination,
            selection,
            strategy: args.strategy.or(file.strategy).unwrap_or(defaults.strategy),
            bulk_tool: args
                .bulk_tool
                .or(file.bulk_tool)
                .unwrap_or(defaults.bulk_tool),
            threads: args.threads.or(file.threads).unwrap_or(defaults.threads).max(1),
            verify: args.verify || file.verify.unwrap_or(false),
            dry_run: args.dry_run,
            report_dir: args
                .report_dir
                .or(file.report_dir)
                .unwrap_or(defaults.report_dir),
            write_report: !args.no_report,
            notify: args.notify,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Assemble the selection from `--select` flags and an optional list
/// file. Backslashes are accepted and normalized to slashes. A supplied
/// but empty selection is a caller error; no selection at all means the
/// whole tree.
fn build_selection(args: &MirrorArgs) -> Result<Option<Selection>, RespaldoError> {
    let mut paths: Vec<String> = Vec::new();

    for path in &args.select {
        paths.push(normalize_input_path(path));
    }

    if let Some(list) = &args.select_from {
        let raw = fs::read_to_string(list).map_err(|e| {
            RespaldoError::Config(format!(
                "Cannot read selection file {}: {}",
                list.display(),
                e
            ))
        })?;
        for line in raw.lines() {
            let line = line.trim();
            if !line.is_empty() {
                paths.push(normalize_input_path(line));
            }
        }
    }

    if args.select.is_empty() && args.select_from.is_none() {
        return Ok(None);
    }

    let selection = Selection::from_paths(paths);
    if selection.is_empty() {
        return Err(RespaldoError::Validation(
            "Selection is empty: nothing to do".to_string(),
        ));
    }
    Ok(Some(selection))
}

fn normalize_input_path(path: &str) -> String {
    path.replace('\\', "/")
}
