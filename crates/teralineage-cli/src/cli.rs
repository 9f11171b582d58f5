//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// teralineage - Teradata SQL lineage analyzer
#[derive(Parser, Debug)]
#[command(name = "teralineage")]
#[command(about = "Extract table/column lineage from Teradata SQL", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL files to analyze (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Error handling mode: abort with a typed error, or emit an error envelope
    #[arg(short, long, default_value = "strict", value_enum)]
    pub mode: ErrorMode,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

/// Error handling mode, per the external interface's two selectable surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorMode {
    /// A parse or traversal failure aborts and surfaces a typed error.
    Strict,
    /// A parse or traversal failure is reported as `{error, type}` in place of a report.
    Soft,
}
