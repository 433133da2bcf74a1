//! Human-readable table output formatting.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt::Write;
use tablescope_core::LineageResult;

/// Format the lineage result as human-readable text with optional colors.
///
/// `sources` names the inputs that were analyzed. The summary line is left
/// out when `quiet` is set.
pub fn format_table(
    result: &LineageResult,
    sources: &[String],
    quiet: bool,
    use_colors: bool,
) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    write_header(&mut out, colored);
    if !quiet {
        write_summary(&mut out, result, sources, colored);
    }

    write_section(&mut out, "Tables read:", &result.tables_read, colored);
    write_section(&mut out, "Tables written:", &result.tables_written, colored);
    write_section(&mut out, "Tables created:", &result.tables_created, colored);
    let functions: Vec<String> = result.functions.iter().map(ToString::to_string).collect();
    write_section(&mut out, "Functions:", &functions, colored);

    out
}

fn write_header(out: &mut String, colored: bool) {
    let title = "TableScope Lineage";
    let line = "═".repeat(50);

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn write_summary(out: &mut String, result: &LineageResult, sources: &[String], colored: bool) {
    if !sources.is_empty() {
        writeln!(out, "Files: {}", sources.join(", ")).unwrap();
    }

    writeln!(out).unwrap();

    let stats = format!(
        "Summary: {} read | {} written | {} created | {} functions",
        result.tables_read.len(),
        result.tables_written.len(),
        result.tables_created.len(),
        result.functions.len()
    );

    if colored {
        writeln!(out, "{}", stats.cyan()).unwrap();
    } else {
        writeln!(out, "{stats}").unwrap();
    }

    writeln!(out).unwrap();
}

fn write_section(out: &mut String, title: &str, entries: &[String], colored: bool) {
    if entries.is_empty() {
        return;
    }

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
    }

    for entry in entries {
        writeln!(out, "  {entry}").unwrap();
    }
    writeln!(out).unwrap();
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
    fn test_format_table_basic() {
        let result = lineage("INSERT INTO a SELECT * FROM b;\nSELECT coalesce(x, 0) FROM b;");
        let output = format_table(&result, &["job.sql".to_string()], false, false);

        assert!(output.contains("TableScope Lineage"));
        assert!(output.contains("Files: job.sql"));
        assert!(output.contains("Summary: 1 read | 1 written | 0 created | 1 functions"));
        assert!(output.contains("Tables read:\n  b\n"));
        assert!(output.contains("Tables written:\n  a\n"));
        assert!(output.contains("Functions:\n  coalesce(2)\n"));
        assert!(!output.contains("Tables created:"));
    }

    #[test]
    fn test_format_table_quiet() {
        let result = lineage("SELECT * FROM users");
        let output = format_table(&result, &[], true, false);

        assert!(!output.contains("Summary:"));
        assert!(output.contains("  users"));
    }
}
