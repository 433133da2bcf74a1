//! JSON output formatting.

use tablescope_core::LineageResult;

/// Format the lineage result as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json(result: &LineageResult, compact: bool) -> String {
    if compact {
        serde_json::to_string(result).expect("serialization cannot fail")
    } else {
        serde_json::to_string_pretty(result).expect("serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablescope_core::LineageSession;

    fn lineage(sql: &str) -> LineageResult {
        let mut session = LineageSession::new();
        session.parse_script_from_code(sql).unwrap();
        session.into_result()
    }

    #[test]
    fn test_json_pretty() {
        let json = format_json(&lineage("INSERT INTO a SELECT * FROM b;\nSELECT upper(x) FROM b;"), false);
        assert!(json.contains('\n'));
        assert!(json.contains("\"tablesWritten\""));
        assert!(json.contains("\"argCount\": 1"));
    }

    #[test]
    fn test_json_compact() {
        let json = format_json(&lineage("SELECT * FROM users"), true);
        assert_eq!(
            json,
            r#"{"tablesRead":["users"],"tablesWritten":[],"tablesCreated":[],"functions":[]}"#
        );
    }
}
