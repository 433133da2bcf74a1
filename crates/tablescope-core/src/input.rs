//! Reading scripts from disk.

use crate::error::LineageError;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Text encodings a script file can be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    Latin1,
}

impl Charset {
    /// Resolves an optional charset name. `None` and blank names mean UTF-8.
    pub fn from_name(name: Option<&str>) -> Result<Self, LineageError> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::Utf8),
            Some(name) => name.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes raw bytes, failing on invalid UTF-8.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, io::Error> {
        match self {
            Self::Utf8 => String::from_utf8(bytes)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl FromStr for Charset {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            _ => Err(LineageError::UnsupportedCharset(s.to_string())),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads a file and decodes it with the given charset.
pub fn read_source_file(path: &Path, charset: Charset) -> Result<String, LineageError> {
    let resource_error = |source| LineageError::Resource {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(resource_error)?;
    charset.decode(bytes).map_err(resource_error)
}
