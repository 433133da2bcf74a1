//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tablescope_core::DEFAULT_MAX_DEPTH;

/// TableScope - table lineage for SQL scripts and embedded SQL
#[derive(Parser, Debug)]
#[command(name = "tablescope")]
#[command(about = "Extract table-level lineage from SQL scripts", long_about = None)]
#[command(version)]
pub struct Args {
    /// Files to analyze (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// SQL dialect
    #[arg(short, long, default_value = "generic", value_enum)]
    pub dialect: DialectArg,

    /// Schema prefixed to unqualified table names
    #[arg(short = 's', long, value_name = "SCHEMA")]
    pub default_schema: Option<String>,

    /// Treat input as job source code and extract the embedded SQL first
    #[arg(short, long)]
    pub embedded: bool,

    /// Input charset (utf-8, iso-8859-1)
    #[arg(long, value_name = "CHARSET")]
    pub charset: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum subquery nesting before a statement is rejected
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, value_name = "DEPTH")]
    pub max_depth: usize,

    /// Suppress the summary in table output
    #[arg(short, long)]
    pub quiet: bool,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl From<DialectArg> for tablescope_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => tablescope_core::Dialect::Generic,
            DialectArg::Ansi => tablescope_core::Dialect::Ansi,
            DialectArg::Bigquery => tablescope_core::Dialect::Bigquery,
            DialectArg::Clickhouse => tablescope_core::Dialect::Clickhouse,
            DialectArg::Databricks => tablescope_core::Dialect::Databricks,
            DialectArg::Duckdb => tablescope_core::Dialect::Duckdb,
            DialectArg::Hive => tablescope_core::Dialect::Hive,
            DialectArg::Mssql => tablescope_core::Dialect::Mssql,
            DialectArg::Mysql => tablescope_core::Dialect::Mysql,
            DialectArg::Postgres => tablescope_core::Dialect::Postgres,
            DialectArg::Redshift => tablescope_core::Dialect::Redshift,
            DialectArg::Snowflake => tablescope_core::Dialect::Snowflake,
            DialectArg::Sqlite => tablescope_core::Dialect::Sqlite,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
}
