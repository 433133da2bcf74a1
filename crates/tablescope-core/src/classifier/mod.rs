//! Per-statement lineage classification.
//!
//! [`classify`] decides which role every table referenced by a statement
//! plays:
//!
//! | Kind | Writes | Creates | Reads |
//! |------|--------|---------|-------|
//! | `INSERT`, `UPDATE`, `DELETE`, `TRUNCATE` | target table | | source query, `FROM`/`USING`/join tables, expression subqueries |
//! | `SELECT` | | | every table reachable from `FROM`, joins, derived tables, CTE bodies, subqueries |
//! | `CALL` | | | subquery arguments |
//! | `CREATE TABLE` | | table name | `AS SELECT` sources |
//! | `CREATE VIEW` | | view name | defining query sources |
//!
//! Function and procedure calls are recorded for `SELECT` and `CALL`,
//! wherever they appear in the statement, including keyword built-ins such
//! as `TRIM` or `EXTRACT`. Every other statement kind is inert and yields an
//! empty [`StatementLineage`].

mod walker;

use crate::error::ClassifyError;
use crate::types::{StatementKind, StatementLineage, DEFAULT_MAX_DEPTH};
use sqlparser::ast::Statement;
use walker::LineageWalker;

impl StatementKind {
    /// The lineage-relevant kind of a parsed statement.
    pub fn of(statement: &Statement) -> Self {
        match statement {
            Statement::Insert(_) => Self::Insert,
            Statement::Update { .. } => Self::Update,
            Statement::Delete(_) => Self::Delete,
            Statement::Truncate { .. } => Self::Truncate,
            Statement::Query(_) => Self::Select,
            Statement::Call(_) => Self::FunctionCall,
            Statement::CreateTable(_) => Self::CreateTable,
            Statement::CreateView { .. } => Self::CreateView,
            _ => Self::Other,
        }
    }

    /// Whether function signatures count as lineage for this kind.
    pub fn records_functions(self) -> bool {
        matches!(self, Self::Select | Self::FunctionCall)
    }
}

/// Classifies one statement with the default nesting limit.
pub fn classify(statement: &Statement) -> Result<StatementLineage, ClassifyError> {
    classify_with_depth(statement, DEFAULT_MAX_DEPTH)
}

/// Classifies one statement, failing once subqueries nest deeper than
/// `max_depth`.
pub fn classify_with_depth(
    statement: &Statement,
    max_depth: usize,
) -> Result<StatementLineage, ClassifyError> {
    let mut lineage = StatementLineage::new(StatementKind::of(statement));
    LineageWalker::new(&mut lineage, max_depth).statement(statement)?;
    Ok(lineage)
}
