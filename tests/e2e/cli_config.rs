//! `logshape config` end-to-end tests.

use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn logshape(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_logshape"));
    command
        .env_remove("LOGSHAPE_TYPE")
        .env_remove("LOGSHAPE_LEVEL")
        .arg("--no-progress")
        .args(args);
    command
}

fn scratch_config(extension: &str, contents: &str) -> io::Result<PathBuf> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();
    let path = std::env::temp_dir().join(format!("logshape-e2e-{unique}.{extension}"));
    std::fs::write(&path, contents)?;
    Ok(path)
}

fn stdout_json(output: &Output) -> io::Result<Value> {
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

#[test]
fn show_renders_effective_config_with_env() -> io::Result<()> {
    let output = logshape(&["--output", "json", "config", "show"])
        .env("LOGSHAPE_TYPE", "from-env")
        .output()?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    let config = value
        .get("effectiveConfig")
        .ok_or_else(|| io::Error::other("missing effectiveConfig"))?;
    assert_eq!(config.get("type").and_then(Value::as_str), Some("from-env"));
    assert_eq!(config.get("level").and_then(Value::as_str), Some("info"));
    Ok(())
}

#[test]
fn show_renders_toml_from_file() -> io::Result<()> {
    let path = scratch_config("toml", "type = \"worker\"\nlevel = \"error\"\n")?;
    let output = logshape(&["config", "show", "--format", "toml", "--config"])
        .arg(&path)
        .output()?;
    std::fs::remove_file(&path)?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("type = \"worker\""));
    assert!(stdout.contains("level = \"error\""));
    Ok(())
}

#[test]
fn check_rejects_invalid_config() -> io::Result<()> {
    let path = scratch_config("json", r#"{"version": 9}"#)?;
    let output = logshape(&["--output", "json", "config", "check", "--config"])
        .arg(&path)
        .output()?;
    std::fs::remove_file(&path)?;
    assert_eq!(output.status.code(), Some(2));

    let value = stdout_json(&output)?;
    assert_eq!(value.get("status").and_then(Value::as_str), Some("error"));
    Ok(())
}

#[test]
fn check_accepts_defaults() -> io::Result<()> {
    let output = logshape(&["config", "check"]).output()?;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "status: ok\nconfig: ok\n"
    );
    Ok(())
}
