//! Error types for lineage extraction.
//!
//! # Error Handling Strategy
//!
//! Every public operation returns `Result<T, LineageError>`. The pipeline is
//! fail-fast: the first error of any kind aborts the rest of the script and
//! nothing is recovered internally.
//!
//! - [`ParseError`]: the grammar rejected the normalized SQL text. Carries the
//!   parser diagnostic plus the line/column when one can be recovered.
//! - [`ClassifyError`]: a parsed statement has a shape the classifier cannot
//!   walk. The session wraps it in [`LineageError::Classification`] together
//!   with the 1-based statement index and the statement kind.
//! - [`LineageError::Resource`]: the script file could not be read.

use crate::types::{Dialect, StatementKind};
use regex::Regex;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::trace;

// Matches "Line: <number>, Column: <number>" with loose whitespace.
static POSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("Invalid regex pattern")
});

/// Top-level failure of a lineage session.
#[derive(Debug, Error)]
pub enum LineageError {
    /// The script was empty or whitespace only.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying SQL grammar rejected the normalized text.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// A statement parsed but could not be classified.
    #[error("analysing statement {index} (type: {kind}) failed: {source}")]
    Classification {
        /// 1-based position of the statement in the script.
        index: usize,
        kind: StatementKind,
        #[source]
        source: ClassifyError,
    },

    /// The script file is missing or unreadable.
    #[error("failed to read {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested charset is not one the reader can decode.
    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),
}

impl LineageError {
    /// Statement index for classification failures.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            Self::Classification { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Failure while walking a single statement's AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Subquery nesting went deeper than the configured limit.
    #[error("nesting depth exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    /// A FROM-clause item the walker has no table semantics for.
    #[error("unsupported table factor: {0}")]
    UnsupportedTableFactor(String),
}

/// Error encountered during SQL parsing.
///
/// Preserves the message of the underlying parser along with the position
/// information it embeds, when available.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Where the error occurred, if the parser reported it.
    pub position: Option<Position>,
    /// The SQL dialect being parsed when the error occurred.
    pub dialect: Option<Dialect>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
}

/// Position information for a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    #[default]
    SyntaxError,
    /// Missing required clause or keyword.
    MissingClause,
    UnexpectedEof,
    LexerError,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Pulls the position out of a sqlparser message such as
    /// "Expected: ..., found: ... at Line: 3, Column: 12".
    ///
    /// This is coupled to the sqlparser message format and returns `None`
    /// when the format is not recognised.
    fn position_from_message(message: &str) -> Option<Position> {
        let position = POSITION_REGEX.captures(message).and_then(|caps| {
            let line = caps.get(1)?.as_str().parse().ok()?;
            let column = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if position.is_none() && message.contains("Line") {
            trace!(
                parser_message = message,
                "parse error mentions a line but no position was recovered"
            );
        }

        position
    }

    fn kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("tokenizer") || lower.contains("unterminated") {
            ParseErrorKind::LexerError
        } else if lower.contains("expected") {
            ParseErrorKind::MissingClause
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQL syntax error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        Self {
            position: Self::position_from_message(&message),
            kind: Self::kind_from_message(&message),
            message,
            dialect: None,
        }
    }
}
