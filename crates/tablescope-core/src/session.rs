//! Script-level lineage accumulation.

use crate::classifier::classify_with_depth;
use crate::error::LineageError;
use crate::extractor::extract_embedded_sql;
use crate::input::{read_source_file, Charset};
use crate::naming::{clean_enclosures, qualify};
use crate::normalizer::{normalize, remove_blank_lines, replace_variable_lookups};
use crate::parser::{SqlParser, StatementParser};
use crate::types::{
    FunctionSignature, LineageResult, SessionOptions, StatementKind, StatementLineage,
};
use std::path::Path;
#[cfg(feature = "tracing")]
use tracing::{debug, info_span};

/// Accumulates table and function lineage over one or more scripts.
///
/// Results from successive calls are merged into the same lists until
/// [`reset`](Self::reset) is called. Every list keeps first-occurrence order
/// and holds each entry once.
///
/// ```
/// use tablescope_core::LineageSession;
///
/// let mut session = LineageSession::new();
/// session.set_default_schema("dwh");
/// session
///     .parse_script_from_code("INSERT INTO facts SELECT * FROM staging.orders")
///     .unwrap();
/// assert_eq!(session.tables_written(), ["dwh.facts"]);
/// assert_eq!(session.tables_read(), ["staging.orders"]);
/// ```
#[derive(Debug, Clone)]
pub struct LineageSession<P = SqlParser> {
    parser: P,
    default_schema: Option<String>,
    max_depth: usize,
    result: LineageResult,
}

impl LineageSession {
    /// A session using the generic dialect and no default schema.
    pub fn new() -> Self {
        Self::with_options(SessionOptions::default())
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self::with_parser(SqlParser::new(options.dialect), &options)
    }
}

impl Default for LineageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: StatementParser> LineageSession<P> {
    /// A session driven by a custom grammar engine. The dialect in `options`
    /// is ignored; the parser decides how text is read.
    pub fn with_parser(parser: P, options: &SessionOptions) -> Self {
        let mut session = Self {
            parser,
            default_schema: None,
            max_depth: options.max_depth,
            result: LineageResult::default(),
        };
        if let Some(schema) = &options.default_schema {
            session.set_default_schema(schema.as_str());
        }
        session
    }

    /// Sets the schema prefixed to unqualified table names from now on.
    /// Blank values are ignored and the current schema is kept.
    pub fn set_default_schema(&mut self, schema: impl Into<String>) {
        let schema = schema.into();
        if schema.trim().is_empty() {
            return;
        }
        self.default_schema = Some(schema);
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Normalizes and parses a SQL script, then merges the lineage of every
    /// statement.
    ///
    /// Fails fast: a syntax error merges nothing, and a classification
    /// failure stops at the offending statement. Lineage merged from earlier
    /// statements stays in the session.
    pub fn parse_script_from_code(&mut self, sql: &str) -> Result<(), LineageError> {
        if sql.trim().is_empty() {
            return Err(LineageError::InvalidInput(
                "SQL script is empty".to_string(),
            ));
        }

        let script = remove_blank_lines(&normalize(sql));
        let statements = self.parser.parse(&script)?;

        #[cfg(feature = "tracing")]
        let _span = info_span!("parse_script", statement_count = statements.len()).entered();

        for (offset, statement) in statements.iter().enumerate() {
            let index = offset + 1;
            let kind = StatementKind::of(statement);

            #[cfg(feature = "tracing")]
            let _stmt_span = info_span!("classify_statement", index, kind = %kind).entered();

            let lineage = classify_with_depth(statement, self.max_depth).map_err(|source| {
                LineageError::Classification {
                    index,
                    kind,
                    source,
                }
            })?;

            #[cfg(feature = "tracing")]
            {
                if lineage.is_empty() {
                    debug!("statement contributes no lineage");
                }
            }

            self.merge(lineage);
        }
        Ok(())
    }

    /// Reads a script file and processes it like
    /// [`parse_script_from_code`](Self::parse_script_from_code).
    ///
    /// `charset` defaults to UTF-8. An empty file is invalid input.
    pub fn parse_script_from_file(
        &mut self,
        path: impl AsRef<Path>,
        charset: Option<&str>,
    ) -> Result<(), LineageError> {
        let charset = Charset::from_name(charset)?;
        let sql = read_source_file(path.as_ref(), charset)?;
        self.parse_script_from_code(&sql)
    }

    /// Recovers the SQL embedded in host-language source and processes it.
    ///
    /// Runtime variable lookups are elided first, while the concatenation
    /// glue around them is still visible, then the payload is extracted and
    /// handed to [`parse_script_from_code`](Self::parse_script_from_code).
    pub fn parse_embedded_code(&mut self, source: &str) -> Result<(), LineageError> {
        let source = replace_variable_lookups(source);
        let sql = extract_embedded_sql(&source);

        #[cfg(feature = "tracing")]
        debug!(payload_len = sql.len(), "extracted embedded SQL");

        self.parse_script_from_code(&sql)
    }

    fn merge(&mut self, lineage: StatementLineage) {
        let schema = self.default_schema.as_deref();
        for name in lineage.reads {
            self.result.add_read(qualify(&name, schema));
        }
        for name in lineage.writes {
            self.result.add_written(qualify(&name, schema));
        }
        for name in lineage.creates {
            self.result.add_created(qualify(&name, schema));
        }
        for signature in lineage.functions {
            self.result.add_function(FunctionSignature::new(
                clean_enclosures(&signature.name),
                signature.arg_count,
            ));
        }
    }

    pub fn tables_read(&self) -> &[String] {
        &self.result.tables_read
    }

    pub fn tables_written(&self) -> &[String] {
        &self.result.tables_written
    }

    pub fn tables_created(&self) -> &[String] {
        &self.result.tables_created
    }

    pub fn functions(&self) -> &[FunctionSignature] {
        &self.result.functions
    }

    pub fn result(&self) -> &LineageResult {
        &self.result
    }

    pub fn into_result(self) -> LineageResult {
        self.result
    }

    /// Clears the accumulated lineage. The default schema is kept.
    pub fn reset(&mut self) {
        self.result.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClassifyError, ParseError};
    use crate::types::Dialect;
    use sqlparser::ast::Statement;

    #[test]
    fn repeated_reads_are_deduplicated_in_first_seen_order() {
        let mut session = LineageSession::new();
        session
            .parse_script_from_code("SELECT * FROM b;\nSELECT * FROM a JOIN b ON a.id = b.id;")
            .unwrap();
        session.parse_script_from_code("SELECT * FROM a").unwrap();
        assert_eq!(session.tables_read(), ["b", "a"]);
    }

    #[test]
    fn default_schema_qualifies_unqualified_names_only() {
        let mut session = LineageSession::new();
        session.set_default_schema("s");
        session
            .parse_script_from_code("INSERT INTO t SELECT * FROM x.t")
            .unwrap();
        assert_eq!(session.tables_written(), ["s.t"]);
        assert_eq!(session.tables_read(), ["x.t"]);
    }

    #[test]
    fn default_schema_applies_to_later_names_only() {
        let mut session = LineageSession::new();
        session.parse_script_from_code("SELECT * FROM t").unwrap();
        session.set_default_schema("s");
        session.parse_script_from_code("SELECT * FROM u").unwrap();
        assert_eq!(session.tables_read(), ["t", "s.u"]);
    }

    #[test]
    fn blank_default_schema_is_ignored() {
        let mut session = LineageSession::new();
        session.set_default_schema("dwh");
        session.set_default_schema("   ");
        session.set_default_schema("");
        assert_eq!(session.default_schema(), Some("dwh"));
    }

    #[test]
    fn options_configure_schema_and_dialect() {
        let options = SessionOptions {
            dialect: Dialect::Mysql,
            default_schema: Some("dwh".to_string()),
            ..SessionOptions::default()
        };
        let mut session = LineageSession::with_options(options);
        session
            .parse_script_from_code("SELECT * FROM `orders`")
            .unwrap();
        assert_eq!(session.tables_read(), ["dwh.orders"]);
    }

    #[test]
    fn reset_clears_results_and_keeps_schema() {
        let mut session = LineageSession::new();
        session.set_default_schema("s");
        session.parse_script_from_code("SELECT * FROM t").unwrap();
        session.reset();
        assert!(session.result().is_empty());
        assert_eq!(session.default_schema(), Some("s"));
    }

    #[test]
    fn blank_script_is_invalid_input() {
        let mut session = LineageSession::new();
        assert!(matches!(
            session.parse_script_from_code(" \n\t "),
            Err(LineageError::InvalidInput(_))
        ));
    }

    #[test]
    fn syntax_error_merges_nothing() {
        let mut session = LineageSession::new();
        let err = session
            .parse_script_from_code("SELECT * FROM a; SELEC * FROM b;")
            .unwrap_err();
        assert!(matches!(err, LineageError::Syntax(_)));
        assert!(session.result().is_empty());
    }

    #[test]
    fn classification_failure_stops_at_offending_statement() {
        let options = SessionOptions {
            max_depth: 2,
            ..SessionOptions::default()
        };
        let mut session = LineageSession::with_options(options);
        let err = session
            .parse_script_from_code(
                "SELECT * FROM first_table;\n\
                 SELECT * FROM (SELECT * FROM (SELECT * FROM deep) a) b;\n\
                 SELECT * FROM third_table;",
            )
            .unwrap_err();

        assert_eq!(err.statement_index(), Some(2));
        match err {
            LineageError::Classification { kind, source, .. } => {
                assert_eq!(kind, StatementKind::Select);
                assert_eq!(source, ClassifyError::DepthLimitExceeded { limit: 2 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.tables_read(), ["first_table"]);
    }

    #[test]
    fn functions_inside_writes_are_not_recorded() {
        let mut session = LineageSession::new();
        session
            .parse_script_from_code("INSERT INTO a SELECT upper(x) FROM b;\nSELECT lower(y) FROM b;")
            .unwrap();
        assert_eq!(session.functions(), [FunctionSignature::new("lower", 1)]);
    }

    #[test]
    fn functions_are_cleaned_but_not_qualified() {
        let mut session = LineageSession::new();
        session.set_default_schema("s");
        session
            .parse_script_from_code("SELECT \"upper\"(name), util.trim_all(x) FROM t")
            .unwrap();
        assert_eq!(
            session.functions(),
            [
                FunctionSignature::new("upper", 1),
                FunctionSignature::new("util.trim_all", 1)
            ]
        );
    }

    #[test]
    fn scripts_are_normalized_before_parsing() {
        let mut session = LineageSession::new();
        session
            .parse_script_from_code("# nightly load\nSET @a := 1;\nSELECT id INTO @v FROM t;")
            .unwrap();
        assert_eq!(session.tables_read(), ["t"]);
    }

    #[test]
    fn embedded_code_runs_the_whole_pipeline() {
        let source = r#"String q = "SELECT id INTO @v FROM orders WHERE id = " + ((Integer)globalMap.get("row.id")) + " AND x = 1";"#;
        let mut session = LineageSession::new();
        session.parse_embedded_code(source).unwrap();
        assert_eq!(session.tables_read(), ["orders"]);
    }

    #[test]
    fn embedded_code_without_sql_is_invalid_input() {
        let mut session = LineageSession::new();
        assert!(matches!(
            session.parse_embedded_code("int x = 1;"),
            Err(LineageError::InvalidInput(_))
        ));
    }

    struct FixedParser(Vec<Statement>);

    impl StatementParser for FixedParser {
        fn parse(&self, _sql: &str) -> Result<Vec<Statement>, ParseError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn custom_parser_drives_the_session() {
        let statements = SqlParser::default()
            .parse("DELETE FROM audit_log")
            .unwrap();
        let mut session =
            LineageSession::with_parser(FixedParser(statements), &SessionOptions::default());
        session.parse_script_from_code("ignored").unwrap();
        assert_eq!(session.tables_written(), ["audit_log"]);
    }
}
