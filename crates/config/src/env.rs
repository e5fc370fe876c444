//! Environment variable parsing and env-to-config merging.
//!
//! Parsing is strict: a variable that is present but empty or invalid fails
//! instead of being ignored.

use crate::schema::{Destination, LoggerConfig, ValidatedLoggerConfig};
use logshape_domain::{LoggerClass, Severity};
use logshape_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: application identity.
pub const ENV_TYPE: &str = "LOGSHAPE_TYPE";
/// Env var: logger class (`app` | `access`).
pub const ENV_CONTEXT: &str = "LOGSHAPE_CONTEXT";
/// Env var: minimum severity.
pub const ENV_LEVEL: &str = "LOGSHAPE_LEVEL";
/// Env var: destination (`stdout` | `stderr` | path).
pub const ENV_DESTINATION: &str = "LOGSHAPE_DESTINATION";
/// Env var: CSV whitelist.
pub const ENV_WHITELIST: &str = "LOGSHAPE_WHITELIST";
/// Env var: CSV error code keys.
pub const ENV_ERROR_CODE_KEYS: &str = "LOGSHAPE_ERROR_CODE_KEYS";

const MAX_CSV_ITEMS: usize = 64;

/// Parsed env overrides; `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerEnv {
    /// Identity override.
    pub app_type: Option<Box<str>>,
    /// Class override.
    pub context: Option<LoggerClass>,
    /// Level override.
    pub level: Option<Severity>,
    /// Destination override.
    pub destination: Option<Destination>,
    /// Whitelist override.
    pub whitelist: Option<Vec<Box<str>>>,
    /// Error code keys override.
    pub error_code_keys: Option<Vec<Box<str>>>,
}

impl LoggerEnv {
    /// Parse env overrides from a key/value map (process env or fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            app_type: parse_optional_trimmed_string(map, ENV_TYPE)?,
            context: parse_optional_enum(map, ENV_CONTEXT)?,
            level: parse_optional_enum(map, ENV_LEVEL)?,
            destination: parse_optional_destination(map, ENV_DESTINATION)?,
            whitelist: parse_optional_csv(map, ENV_WHITELIST)?,
            error_code_keys: parse_optional_csv(map, ENV_ERROR_CODE_KEYS)?,
        })
    }

    /// True when no variable was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: LoggerConfig,
    env: &LoggerEnv,
) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(app_type) = &env.app_type {
        config.app_type = app_type.clone();
    }
    if let Some(context) = env.context {
        config.context = context;
    }
    if let Some(level) = env.level {
        config.level = level;
    }
    if let Some(destination) = &env.destination {
        config.destination = destination.clone();
    }
    if let Some(whitelist) = &env.whitelist {
        config.whitelist.clone_from(whitelist);
    }
    if let Some(keys) = &env.error_code_keys {
        config.error_code_keys.clone_from(keys);
    }

    if !env.is_empty() {
        tracing::debug!(target: "logshape", "env overrides applied to logger config");
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Typed env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV list exceeds a safety limit.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of parsed items.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
            Self::CsvTooLarge { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
            EnvParseError::CsvTooLarge { var, len, max } => envelope
                .with_metadata("env_var", var)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.into()))
}

fn parse_optional_enum<T: std::str::FromStr>(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<T>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidEnum {
            var,
            value: trimmed.into_string(),
        })
}

fn parse_optional_destination(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Destination>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    Destination::parse(&trimmed)
        .map(Some)
        .map_err(|_| EnvParseError::EmptyValue { var })
}

fn parse_optional_csv(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<Box<str>>>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    let values = parse_csv(&raw);
    if values.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    if values.len() > MAX_CSV_ITEMS {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: values.len(),
            max: MAX_CSV_ITEMS,
        });
    }
    Ok(Some(values))
}

fn parse_csv(input: &str) -> Vec<Box<str>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Box::from)
        .collect()
}
