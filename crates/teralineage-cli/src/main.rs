//! teralineage CLI - Teradata SQL lineage analyzer

mod cli;
mod input;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use teralineage_core::{analyze, parse_sql, Error, ErrorEnvelope};

use cli::{Args, ErrorMode};
use output::format_json;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("teralineage: error: {e:#}");
            ExitCode::from(66)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    init_tracing();

    let sql = input::read_input(&args.files)?;

    let statements = match parse_sql(&sql) {
        Ok(statements) => statements,
        Err(parse_err) => return handle_error(Error::from(parse_err), &args),
    };

    let report = analyze(&statements, &sql);
    let json = format_json(&report, args.compact);
    write_output(&args.output, &json)?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches a fatal error per the external interface's two selectable modes: strict
/// aborts with a typed error (non-zero exit), soft prints `{error, type}` in place of a
/// report and exits 0.
fn handle_error(err: Error, args: &Args) -> Result<ExitCode> {
    match args.mode {
        ErrorMode::Strict => Err(err.into()),
        ErrorMode::Soft => {
            let envelope = ErrorEnvelope::from(&err);
            let json = format_json(&envelope, args.compact);
            write_output(&args.output, &json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("failed to write to {}", path.display()))?;
    } else {
        let mut stdout = io::stdout();
        stdout
            .write_all(content.as_bytes())
            .context("failed to write to stdout")?;
        if !content.ends_with('\n') {
            stdout.write_all(b"\n").context("failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}
