//! Recovery of SQL text from host-language string-literal concatenation.
//!
//! ETL job code builds SQL as a chain of double-quoted literals glued with
//! `+` and interleaved with runtime lookups:
//!
//! ```text
//! "SELECT id, name " +
//! "FROM customers WHERE region = 'north'" + "\n"
//! ```
//!
//! The extractor keeps only what sits inside the double quotes and joins it
//! into one continuous payload, undoing the host escapes for `"` and `\`.

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between host-language string literals; everything is discarded.
    Outside,
    /// Inside a host-language string literal, i.e. inside SQL text.
    InSql {
        /// Inside a single-quoted SQL string literal.
        in_string_literal: bool,
        /// The previous character was an escaping backslash.
        masked: bool,
    },
}

impl ScanState {
    const ENTERED: ScanState = ScanState::InSql {
        in_string_literal: false,
        masked: false,
    };
}

/// Removes line-continuation artifacts before scanning: carriage returns,
/// tabs (replaced by a space) and literal `\n` escape sequences.
fn strip_host_artifacts(source: &str) -> String {
    source.replace('\r', "").replace('\t', " ").replace("\\n", "")
}

/// Extracts the SQL payload embedded in host-language source.
///
/// Returns an empty string when the source holds no double-quoted segment.
pub fn extract_embedded_sql(source: &str) -> String {
    let source = strip_host_artifacts(source);
    let mut sql = String::with_capacity(source.len());
    let mut state = ScanState::Outside;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match state {
            ScanState::Outside => {
                if ch == '"' {
                    ScanState::ENTERED
                } else {
                    ScanState::Outside
                }
            }
            ScanState::InSql {
                in_string_literal,
                masked,
            } => match ch {
                '"' if masked => {
                    sql.push(ch);
                    ScanState::InSql {
                        in_string_literal,
                        masked: false,
                    }
                }
                // End of the host literal. An open SQL string literal does not
                // carry over into the next segment.
                '"' => ScanState::Outside,
                '\\' if !masked && matches!(chars.peek(), Some('"' | '\\')) => ScanState::InSql {
                    in_string_literal,
                    masked: true,
                },
                '\'' => {
                    sql.push(ch);
                    ScanState::InSql {
                        in_string_literal: !in_string_literal,
                        masked: false,
                    }
                }
                _ => {
                    sql.push(ch);
                    ScanState::InSql {
                        in_string_literal,
                        masked: false,
                    }
                }
            },
        };
    }

    sql
}
