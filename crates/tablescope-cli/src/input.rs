//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::PathBuf;
use tablescope_core::{read_source_file, Charset};

/// One input to analyze.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub name: String,
    pub content: String,
}

/// Read input from files or stdin, decoded with `charset`.
///
/// If no files are provided, reads from stdin.
pub fn read_input(files: &[PathBuf], charset: Charset) -> Result<Vec<SourceInput>> {
    if files.is_empty() {
        read_from_stdin(charset)
    } else {
        read_from_files(files, charset)
    }
}

fn read_from_stdin(charset: Charset) -> Result<Vec<SourceInput>> {
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read from stdin")?;
    let content = charset
        .decode(bytes)
        .with_context(|| format!("Failed to decode stdin as {charset}"))?;

    Ok(vec![SourceInput {
        name: "<stdin>".to_string(),
        content,
    }])
}

fn read_from_files(files: &[PathBuf], charset: Charset) -> Result<Vec<SourceInput>> {
    files
        .iter()
        .map(|path| {
            let content = read_source_file(path, charset)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(SourceInput {
                name: path.display().to_string(),
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SELECT * FROM users").unwrap();

        let sources = read_from_files(&[file.path().to_path_buf()], Charset::Utf8).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].content.contains("SELECT * FROM users"));
    }

    #[test]
    fn test_read_latin1_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"SELECT '\xfc' FROM users").unwrap();

        let sources = read_from_files(&[file.path().to_path_buf()], Charset::Latin1).unwrap();
        assert_eq!(sources[0].content, "SELECT 'ü' FROM users");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_from_files(&[PathBuf::from("/nonexistent/file.sql")], Charset::Utf8);
        assert!(result.is_err());
    }
}
