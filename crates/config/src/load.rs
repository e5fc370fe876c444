//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{Destination, LoggerConfig, LoggerEnv, ValidatedLoggerConfig, apply_env_overrides};
use logshape_domain::{LoggerClass, Severity};
use logshape_shared::{ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the logger config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`LoggerEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`LoggerConfig::default()`)
pub fn load_logger_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &LoggerEnv,
) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    let config = match config_json {
        None => LoggerConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };
    finish(config, overrides_json, env)
}

/// Load the logger config from an optional file path (`.json` or `.toml`).
pub fn load_logger_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &LoggerEnv,
) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    let config = match config_path {
        None => LoggerConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };
    finish(config, overrides_json, env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &LoggerConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &LoggerConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn finish(
    mut config: LoggerConfig,
    overrides_json: Option<&str>,
    env: &LoggerEnv,
) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        overrides.apply(&mut config);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<LoggerConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<LoggerConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct LoggerConfigOverrides {
    version: Option<u32>,
    #[serde(rename = "type")]
    app_type: Option<Box<str>>,
    context: Option<LoggerClass>,
    level: Option<Severity>,
    destination: Option<Destination>,
    whitelist: Option<Vec<Box<str>>>,
    error_code_keys: Option<Vec<Box<str>>>,
    message_key: Option<Box<str>>,
    timestamp_key: Option<Box<str>>,
}

impl LoggerConfigOverrides {
    fn apply(self, config: &mut LoggerConfig) {
        set(&mut config.version, self.version);
        set(&mut config.app_type, self.app_type);
        set(&mut config.context, self.context);
        set(&mut config.level, self.level);
        set(&mut config.destination, self.destination);
        set(&mut config.whitelist, self.whitelist);
        set(&mut config.error_code_keys, self.error_code_keys);
        set(&mut config.message_key, self.message_key);
        set(&mut config.timestamp_key, self.timestamp_key);
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}
