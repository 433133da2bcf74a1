use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::tempdir;

fn tablescope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tablescope"))
}

#[test]
fn writes_json_lineage_to_file() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("load.sql");
    let output_path = dir.path().join("lineage.json");

    std::fs::write(
        &sql_path,
        "INSERT INTO facts SELECT id, sum(amount) FROM staging.sales GROUP BY id;\n\n\
         CREATE VIEW report AS SELECT * FROM facts;\n\
         SELECT max(id) FROM facts;",
    )
    .expect("write sql");

    let status = tablescope()
        .args([
            "-f",
            "json",
            "-s",
            "dwh",
            "-o",
            output_path.to_str().expect("output path"),
            sql_path.to_str().expect("sql path"),
        ])
        .status()
        .expect("run CLI");

    assert!(status.success());
    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).expect("read output"))
            .expect("valid json");
    assert_eq!(json["tablesRead"], serde_json::json!(["staging.sales", "dwh.facts"]));
    assert_eq!(json["tablesWritten"], serde_json::json!(["dwh.facts"]));
    assert_eq!(json["tablesCreated"], serde_json::json!(["dwh.report"]));
    assert_eq!(
        json["functions"],
        serde_json::json!([{ "name": "max", "argCount": 1 }])
    );
}

#[test]
fn extracts_embedded_sql_from_stdin() {
    let mut child = tablescope()
        .args(["-e", "-f", "json", "-c"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("run CLI");

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"String q = "SELECT * FROM crm.customers WHERE id = " + ((Integer)globalMap.get("id")) + "";"#)
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait for CLI");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert_eq!(
        stdout.trim(),
        r#"{"tablesRead":["crm.customers"],"tablesWritten":[],"tablesCreated":[],"functions":[]}"#
    );
}

#[test]
fn plain_script_with_hash_comments_is_normalized() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("cursor.sql");
    std::fs::write(
        &sql_path,
        "# refresh cursor\nSET @cutoff := 10;\nSELECT id INTO @last FROM audit.events;\n",
    )
    .expect("write sql");

    let output = tablescope()
        .args(["-f", "json", "-c", sql_path.to_str().expect("sql path")])
        .output()
        .expect("run CLI");

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["tablesRead"], serde_json::json!(["audit.events"]));
}

#[test]
fn syntax_error_exits_with_failure() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("broken.sql");
    std::fs::write(&sql_path, "SELEC * FROM users").expect("write sql");

    let output = tablescope()
        .arg(sql_path.to_str().expect("sql path"))
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.sql"), "stderr: {stderr}");
}

#[test]
fn classification_failure_keeps_earlier_files() {
    let dir = tempdir().expect("temp dir");
    let first = dir.path().join("first.sql");
    let second = dir.path().join("second.sql");
    std::fs::write(&first, "SELECT * FROM early").expect("write sql");
    std::fs::write(
        &second,
        "SELECT * FROM late;\nSELECT * FROM (SELECT * FROM (SELECT * FROM deep) a) b;",
    )
    .expect("write sql");

    let output = tablescope()
        .args(["-f", "json", "-c", "--max-depth", "2"])
        .arg(&first)
        .arg(&second)
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(1));
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["tablesRead"], serde_json::json!(["early", "late"]));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("analysing statement 2 (type: SELECT) failed"), "stderr: {stderr}");
}

#[test]
fn missing_file_is_a_configuration_error() {
    let dir = tempdir().expect("temp dir");
    let output = tablescope()
        .arg(dir.path().join("missing.sql"))
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn unknown_charset_is_a_configuration_error() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("load.sql");
    std::fs::write(&sql_path, "SELECT 1").expect("write sql");

    let output = tablescope()
        .args(["--charset", "ebcdic"])
        .arg(&sql_path)
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(66));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported charset: ebcdic"), "stderr: {stderr}");
}

#[test]
fn table_output_lists_roles() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("load.sql");
    std::fs::write(&sql_path, "TRUNCATE TABLE dwh.facts").expect("write sql");

    let output = tablescope().arg(&sql_path).output().expect("run CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tables written:\n  dwh.facts"), "stdout: {stdout}");
}

#[test]
fn quiet_table_output_on_a_pipe_is_plain() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("load.sql");
    std::fs::write(&sql_path, "SELECT * FROM crm.customers").expect("write sql");

    let output = tablescope()
        .arg("-q")
        .arg(&sql_path)
        .output()
        .expect("run CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Summary:"), "stdout: {stdout}");
    assert!(!stdout.contains('\u{1b}'), "stdout: {stdout}");
    assert!(stdout.contains("  crm.customers"), "stdout: {stdout}");
}
