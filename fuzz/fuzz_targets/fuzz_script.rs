//! Fuzz target for script sessions across dialects and nesting limits.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use tablescope_core::{Dialect, LineageSession, SessionOptions};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    dialect_idx: u8,
    default_schema: Option<String>,
    max_depth: u8,
}

impl FuzzInput {
    fn dialect(&self) -> Dialect {
        match self.dialect_idx % 4 {
            0 => Dialect::Generic,
            1 => Dialect::Mysql,
            2 => Dialect::Postgres,
            _ => Dialect::Mssql,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let options = SessionOptions {
        dialect: input.dialect(),
        default_schema: input.default_schema.clone(),
        max_depth: usize::from(input.max_depth),
    };
    let mut session = LineageSession::with_options(options);
    if session.parse_script_from_code(&input.sql).is_ok() {
        let result = session.into_result();
        let unique: HashSet<&String> = result.tables_read.iter().collect();
        assert_eq!(unique.len(), result.tables_read.len());
    }
});
