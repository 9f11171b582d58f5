//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::PathBuf;

/// Reads SQL input from files or stdin, concatenated into one source text.
///
/// If no files are provided, reads from stdin. Multiple files are joined with a
/// newline so statement-separator `;` tokens at file boundaries still parse correctly
/// and every input contributes to the one aggregated report.
pub fn read_input(files: &[PathBuf]) -> Result<String> {
    if files.is_empty() {
        read_from_stdin()
    } else {
        read_from_files(files)
    }
}

fn read_from_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("failed to read from stdin")?;
    Ok(content)
}

fn read_from_files(files: &[PathBuf]) -> Result<String> {
    let mut combined = String::new();
    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        combined.push_str(&content);
        combined.push('\n');
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SELECT * FROM users").unwrap();
        let sql = read_from_files(&[file.path().to_path_buf()]).unwrap();
        assert!(sql.contains("SELECT * FROM users"));
    }

    #[test]
    fn concatenates_multiple_files() {
        let mut file1 = NamedTempFile::new().unwrap();
        let mut file2 = NamedTempFile::new().unwrap();
        writeln!(file1, "SELECT a FROM t;").unwrap();
        writeln!(file2, "SELECT b FROM u;").unwrap();
        let sql = read_from_files(&[file1.path().to_path_buf(), file2.path().to_path_buf()]).unwrap();
        assert!(sql.contains("SELECT a FROM t"));
        assert!(sql.contains("SELECT b FROM u"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_from_files(&[PathBuf::from("/nonexistent/file.sql")]);
        assert!(result.is_err());
    }
}
