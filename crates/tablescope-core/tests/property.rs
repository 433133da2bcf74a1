use proptest::prelude::*;
use tablescope_core::normalizer::{
    collapse_blank_lines, remove_into_variables, replace_hash_comments_and_assignments,
    replace_variable_lookups,
};
use tablescope_core::{extract_embedded_sql, normalize, LineageSession};

fn sql_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        Just("# note".to_string()),
        Just("  ## nested # hashes".to_string()),
        Just("SET @a := 1".to_string()),
        Just("x: INTO @v= 1".to_string()),
        Just("SELECT a INTO @v, @w FROM t".to_string()),
        Just("WHERE id = globalMap.get(\"row.id\")".to_string()),
        Just("-- already a comment".to_string()),
        "[a-zA-Z0-9 #:=@,.'()\"+_-]{0,24}",
    ]
}

fn sql_text() -> impl Strategy<Value = String> {
    prop::collection::vec(sql_line(), 0..12).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in sql_text()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn each_rewrite_is_idempotent(text in sql_text()) {
        let rewrites: [fn(&str) -> String; 4] = [
            replace_variable_lookups,
            replace_hash_comments_and_assignments,
            remove_into_variables,
            collapse_blank_lines,
        ];
        for rewrite in rewrites {
            let once = rewrite(&text);
            prop_assert_eq!(rewrite(&once), once);
        }
    }

    #[test]
    fn extractor_never_emits_more_than_its_input(source in "[a-z \"'\\\\+;]{0,64}") {
        let sql = extract_embedded_sql(&source);
        prop_assert!(sql.len() <= source.len());
    }

    #[test]
    fn accumulated_reads_are_unique_and_in_first_seen_order(
        tables in prop::collection::vec("t[a-e]", 1..10),
    ) {
        let script = tables
            .iter()
            .map(|table| format!("SELECT * FROM {table};"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut session = LineageSession::new();
        session.parse_script_from_code(&script).unwrap();

        let mut expected: Vec<&str> = Vec::new();
        for table in &tables {
            if !expected.contains(&table.as_str()) {
                expected.push(table);
            }
        }
        prop_assert_eq!(session.tables_read(), expected.as_slice());
    }
}
