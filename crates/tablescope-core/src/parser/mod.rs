//! The seam between the lineage pipeline and the SQL grammar.
//!
//! Everything downstream consumes `sqlparser` statements, but only through
//! [`StatementParser`], so a session can be driven by any grammar engine that
//! produces them.

use crate::error::ParseError;
use crate::types::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Turns normalized SQL text into statements, in source order.
pub trait StatementParser {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, ParseError>;
}

/// [`StatementParser`] backed by `sqlparser` with a fixed dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlParser {
    dialect: Dialect,
}

impl SqlParser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl StatementParser for SqlParser {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, ParseError> {
        parse_sql_with_dialect(sql, self.dialect)
    }
}

/// Parse SQL using the specified dialect.
pub fn parse_sql_with_dialect(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match Parser::parse_sql(sqlparser_dialect.as_ref(), sql) {
        Ok(statements) => Ok(statements),
        Err(primary_err) => {
            // The generic dialect rejects `::` casts and JSON arrows that show
            // up in warehouse SQL; retry those with Postgres rules.
            if matches!(dialect, Dialect::Generic) && looks_like_postgres_syntax(sql) {
                if let Ok(statements) = Parser::parse_sql(&PostgreSqlDialect {}, sql) {
                    return Ok(statements);
                }
            }
            Err(ParseError::from(primary_err).with_dialect(dialect))
        }
    }
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::") || sql.contains("->")
}
