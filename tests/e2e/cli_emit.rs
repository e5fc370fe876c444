//! `logshape emit` end-to-end tests.

use serde_json::Value;
use std::io;
use std::process::{Command, Output};

fn logshape(args: &[&str]) -> io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_logshape"))
        .env_remove("LOGSHAPE_DIAGNOSTICS")
        .env("LOGSHAPE_TYPE", "e2e")
        .arg("--no-progress")
        .args(args)
        .output()
}

fn single_record(output: &Output) -> io::Result<Value> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let line = lines
        .next()
        .ok_or_else(|| io::Error::other("no record written"))?;
    if lines.next().is_some() {
        return Err(io::Error::other("more than one record written"));
    }
    serde_json::from_str(line).map_err(io::Error::other)
}

fn text<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

#[test]
fn emit_writes_one_flat_record() -> io::Result<()> {
    let output = logshape(&[
        "emit",
        "--level",
        "warn",
        "--fields",
        r#"{"order":{"id":7},"pid":42}"#,
        "--message",
        "order delayed",
    ])?;
    assert!(output.status.success());

    let record = single_record(&output)?;
    assert_eq!(text(&record, "type"), Some("e2e"));
    assert_eq!(text(&record, "context"), Some("app"));
    assert_eq!(text(&record, "order"), Some(r#"{"id":7}"#));
    assert_eq!(record.get("pid"), Some(&Value::from(42)));
    assert_eq!(text(&record, "loglevel"), Some("WARN"));
    assert_eq!(text(&record, "message"), Some("order delayed"));
    assert!(record.get("time").is_some_and(Value::is_u64));
    Ok(())
}

#[test]
fn emit_normalizes_errors_in_field_position() -> io::Result<()> {
    let output = logshape(&[
        "emit",
        "--level",
        "error",
        "--message",
        "payment failed",
        "--error-message",
        "card declined",
        "--error-code",
        "402",
        "--error-stack",
        "Error: card declined\n    at charge (/srv/pay.js:12:5)",
    ])?;
    assert!(output.status.success());

    let record = single_record(&output)?;
    assert_eq!(text(&record, "message"), Some("payment failed"));
    assert_eq!(text(&record, "error_message"), Some("card declined"));
    assert_eq!(text(&record, "error_code"), Some("402"));
    assert_eq!(text(&record, "error_file"), Some("/srv/pay.js"));
    assert_eq!(text(&record, "error_line"), Some("12"));
    assert!(record.get("stack").is_none());
    Ok(())
}

#[test]
fn emit_error_in_message_position_uses_error_message() -> io::Result<()> {
    let output = logshape(&[
        "emit",
        "--level",
        "error",
        "--fields",
        r#"{"a":"b"}"#,
        "--error-message",
        "disk full",
        "--error-position",
        "message",
    ])?;
    assert!(output.status.success());

    let record = single_record(&output)?;
    assert_eq!(text(&record, "a"), Some("b"));
    assert_eq!(text(&record, "message"), Some("disk full"));
    assert_eq!(text(&record, "error_stack"), Some("Error: disk full"));
    assert!(record.get("error_message").is_none());
    assert!(record.get("error_code").is_none());
    assert!(record.get("error_file").is_none());
    assert!(record.get("error_line").is_none());
    Ok(())
}

#[test]
fn access_class_keeps_structure() -> io::Result<()> {
    let output = logshape(&[
        "emit",
        "--overrides-json",
        r#"{"context":"access"}"#,
        "--fields",
        r#"{"status":200,"route":["api","v1"]}"#,
    ])?;
    assert!(output.status.success());

    let record = single_record(&output)?;
    assert_eq!(text(&record, "context"), Some("access"));
    assert_eq!(record.get("status"), Some(&Value::from(200)));
    assert_eq!(record.get("route"), Some(&serde_json::json!(["api", "v1"])));
    assert!(record.get("loglevel").is_none());
    assert!(record.get("message").is_none());
    Ok(())
}

#[test]
fn below_minimum_level_writes_nothing() -> io::Result<()> {
    let output = logshape(&["emit", "--level", "debug", "--message", "quiet"])?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn invalid_input_exits_with_two() -> io::Result<()> {
    let output = logshape(&["emit", "--level", "loud", "--message", "x"])?;
    assert_eq!(output.status.code(), Some(2));

    let output = logshape(&["emit", "--fields", "[1,2]"])?;
    assert_eq!(output.status.code(), Some(2));

    let output = logshape(&["emit"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn unopenable_destination_exits_with_three() -> io::Result<()> {
    let output = logshape(&[
        "--output",
        "json",
        "emit",
        "--message",
        "x",
        "--overrides-json",
        r#"{"destination":"/nonexistent/logshape/dir/out.log"}"#,
    ])?;
    assert_eq!(output.status.code(), Some(3));

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(value.get("status").and_then(Value::as_str), Some("error"));
    Ok(())
}
