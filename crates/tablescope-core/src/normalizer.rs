//! Text rewrites that turn dialect-specific SQL into something the grammar
//! accepts.
//!
//! Each rewrite is independent and idempotent. [`normalize`] applies all of
//! them in order.

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder substituted for runtime variable lookups.
pub const VARIABLE_PLACEHOLDER: &str = "999999";

/// Token that must be present before the lookup pattern is tried.
const VARIABLE_MAP_MARKER: &str = "globalMap";

/// A `globalMap.get("key")` lookup, optionally wrapped in a cast such as
/// `((Integer)...)`, together with the string-concatenation glue around it
/// (`" + ` before and ` + "` after) so the surrounding literals fuse.
///
/// Keys are letters, `-`, and anything in the ASCII run from `.` to `_`
/// (digits, `/`, `:`, `@`, brackets and so on).
static VARIABLE_LOOKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:"\s*)?(?:\+\s*)?(?:\(\s*){0,2}(?:(?:String|Integer|Long|Boolean|Date)\s*\)\s*)?globalMap\.get\s*\(\s*\\?"[\x2E-\x5Fa-z\-]+\\?"\s*\)(?:\s*\))?(?:\s*\+)?(?:\s*")?"#,
    )
    .expect("Invalid regex pattern")
});

/// `INTO @var[, @var ...]` including the whitespace in front of it.
static INTO_VARIABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\binto\s+@\w+(?:\s*,\s*@\w+)*").expect("Invalid regex pattern")
});

/// Applies every rewrite in order.
///
/// One rewrite can expose input for another (dropping an `INTO @v` may join
/// `:` and `=`), so the sequence is repeated until the text stops changing.
/// Each pass either removes a line-leading `#` or shortens the text.
pub fn normalize(sql: &str) -> String {
    let mut current = normalize_once(sql);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(sql: &str) -> String {
    let sql = replace_variable_lookups(sql);
    let sql = replace_hash_comments_and_assignments(&sql);
    let sql = remove_into_variables(&sql);
    collapse_blank_lines(&sql)
}

/// Replaces runtime variable-map lookups with [`VARIABLE_PLACEHOLDER`].
///
/// Text without the map marker is returned unchanged.
pub fn replace_variable_lookups(text: &str) -> String {
    if !text.contains(VARIABLE_MAP_MARKER) {
        return text.to_string();
    }
    replace_until_stable(&VARIABLE_LOOKUP, text, VARIABLE_PLACEHOLDER)
}

/// Turns `#` line comments into `--` comments and `:=` into `=`.
pub fn replace_hash_comments_and_assignments(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let mut line = match trimmed.strip_prefix('#') {
                Some(rest) => {
                    let indent = &line[..line.len() - trimmed.len()];
                    format!("{indent}-- {}", rest.trim_start())
                }
                None => line.to_string(),
            };
            while line.contains(":=") {
                line = line.replace(":=", "=");
            }
            line
        })
        .collect();
    lines.join("\n").trim().to_string()
}

/// Drops `INTO @var` clauses that assign query results to session variables.
pub fn remove_into_variables(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| replace_until_stable(&INTO_VARIABLES, line, ""))
        .collect();
    lines.join("\n").trim().to_string()
}

// A single pass can splice text into a fresh match; repeat until nothing moves.
fn replace_until_stable(pattern: &Regex, text: &str, replacement: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pattern.replace_all(&current, replacement);
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

/// Collapses runs of blank lines into one and trims the whole text.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = true;
    for line in text.lines() {
        if line.trim().is_empty() {
            if !previous_blank {
                out.push('\n');
            }
            previous_blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            previous_blank = false;
        }
    }
    out.trim().to_string()
}

/// Removes every blank line. Applied to a script right before parsing.
pub fn remove_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
