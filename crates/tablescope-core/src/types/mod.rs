//! Types for the lineage session API.
//!
//! Request-side types configure a session (dialect, default schema, depth
//! limit). Response-side types carry what the classifier found for a single
//! statement and what a session accumulated over a whole script.

mod request;
mod response;

pub use request::{Dialect, SessionOptions, DEFAULT_MAX_DEPTH};
pub use response::{FunctionSignature, LineageResult, StatementKind, StatementLineage};
