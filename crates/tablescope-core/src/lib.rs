//! Table-level lineage for SQL scripts and for SQL embedded in host-language
//! source code.
//!
//! The pipeline runs left to right: [`extract_embedded_sql`] recovers the SQL
//! payload from string-literal concatenation, [`normalize`] rewrites dialect
//! quirks the grammar rejects, a [`StatementParser`] produces statements, and
//! [`classify`] sorts each statement's tables into reads, writes and creates.
//! [`LineageSession`] drives the whole thing and accumulates the results.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod input;
pub mod naming;
pub mod normalizer;
pub mod parser;
pub mod session;
pub mod types;

// Re-export main types and functions
pub use classifier::{classify, classify_with_depth};
pub use error::{ClassifyError, LineageError, ParseError};
pub use extractor::extract_embedded_sql;
pub use input::{read_source_file, Charset};
pub use normalizer::normalize;
pub use parser::{parse_sql_with_dialect, SqlParser, StatementParser};
pub use session::LineageSession;

pub use types::{
    Dialect, FunctionSignature, LineageResult, SessionOptions, StatementKind, StatementLineage,
    DEFAULT_MAX_DEPTH,
};
