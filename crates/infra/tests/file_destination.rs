//! Loggers built from config writing to a file destination.

use logshape_config::{Destination, LoggerConfig, LoggerEnv, load_logger_config_from_sources};
use logshape_domain::{ErrorLike, FieldMap, LoggerClass};
use logshape_infra::{create_logger, load_effective_config_json, open_sink};
use logshape_shared::ErrorCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn scratch_file(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("logshape-infra-{label}-{unique}.log"))
}

fn read_records(path: &PathBuf) -> Result<Vec<Value>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    std::fs::remove_file(path)?;
    contents
        .lines()
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}

#[test]
fn app_logger_writes_flat_records_with_custom_keys() -> Result<(), Box<dyn Error>> {
    let path = scratch_file("app");
    let config = LoggerConfig {
        app_type: "billing".into(),
        destination: Destination::File(path.clone()),
        message_key: "msg".into(),
        timestamp_key: "ts".into(),
        ..LoggerConfig::default()
    }
    .validate_and_normalize()?;

    let logger = create_logger(&config)?;
    logger.debug("dropped below info");
    logger.info((FieldMap::new().with("attempt", 2), "charged"));
    logger
        .child(FieldMap::new().with("job", "nightly"))
        .error((ErrorLike::new("card declined").with_code(402), "charge failed"));

    let records = read_records(&path)?;
    assert_eq!(records.len(), 2);

    let first = records.first().ok_or("missing first record")?;
    assert_eq!(first.get("type"), Some(&Value::from("billing")));
    assert_eq!(first.get("attempt"), Some(&Value::from("2")));
    assert_eq!(first.get("loglevel"), Some(&Value::from("INFO")));
    assert_eq!(first.get("msg"), Some(&Value::from("charged")));
    assert!(first.get("ts").is_some_and(Value::is_u64));

    let second = records.get(1).ok_or("missing second record")?;
    assert_eq!(second.get("job"), Some(&Value::from("nightly")));
    assert_eq!(second.get("error_code"), Some(&Value::from("402")));
    assert_eq!(second.get("error_message"), Some(&Value::from("card declined")));
    assert!(second.get("stack").is_none());
    Ok(())
}

#[test]
fn access_logger_from_sources_keeps_structure() -> Result<(), Box<dyn Error>> {
    let path = scratch_file("access");
    let config_json = serde_json::json!({
        "type": "gateway",
        "context": "access",
        "destination": path.display().to_string(),
    })
    .to_string();
    let config = load_logger_config_from_sources(Some(&config_json), None, &LoggerEnv::default())?;
    assert_eq!(config.context, LoggerClass::Access);

    let logger = create_logger(&config)?;
    logger.info((
        FieldMap::new().with("request", serde_json::json!({ "path": "/", "status": 200 })),
        "request served",
    ));

    let records = read_records(&path)?;
    let record = records.first().ok_or("missing record")?;
    assert_eq!(record.get("context"), Some(&Value::from("access")));
    assert_eq!(
        record.get("request"),
        Some(&serde_json::json!({ "path": "/", "status": 200 }))
    );
    assert!(record.get("loglevel").is_none());
    Ok(())
}

#[test]
fn unopenable_destination_is_an_io_error() -> Result<(), Box<dyn Error>> {
    let path = scratch_file("missing").join("nested").join("out.log");
    let error = open_sink(&Destination::File(path))
        .err()
        .ok_or("expected open failure")?;

    assert_eq!(error.code, ErrorCode::not_found());
    assert!(error.metadata.contains_key("destination"));
    Ok(())
}

#[test]
fn effective_config_json_reflects_env() -> Result<(), Box<dyn Error>> {
    let env = BTreeMap::from([
        ("LOGSHAPE_TYPE".to_string(), "from-env".to_string()),
        ("LOGSHAPE_LEVEL".to_string(), "fatal".to_string()),
    ]);
    let rendered = load_effective_config_json(&env, None, None)?;
    let value: Value = serde_json::from_str(&rendered)?;

    assert_eq!(value.get("type"), Some(&Value::from("from-env")));
    assert_eq!(value.get("level"), Some(&Value::from("fatal")));
    assert_eq!(value.get("destination"), Some(&Value::from("stdout")));
    Ok(())
}
