//! Logger configuration schema, validation and normalization.

use logshape_domain::reserved::RESERVED_KEYS;
use logshape_domain::{ErrorCodeKeys, LoggerClass, Severity, Whitelist};
use logshape_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Current supported config schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default application identity.
pub const DEFAULT_APP_TYPE: &str = "app";
/// Maximum whitelist entries.
pub const MAX_WHITELIST_KEYS: usize = 64;
/// Maximum error code lookup keys.
pub const MAX_ERROR_CODE_KEYS: usize = 16;

/// Where emitted lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Destination {
    /// Process stdout.
    #[default]
    Stdout,
    /// Process stderr.
    Stderr,
    /// A file, appended to.
    File(PathBuf),
}

impl Destination {
    /// Parse a destination name; anything other than `stdout`/`stderr` is a path.
    pub fn parse(input: &str) -> Result<Self, ConfigSchemaError> {
        let trimmed = input.trim();
        match trimmed {
            "" => Err(ConfigSchemaError::EmptyField {
                field: "destination",
            }),
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    /// File path, if this is a file destination.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stdout | Self::Stderr => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => formatter.write_str("stdout"),
            Self::Stderr => formatter.write_str("stderr"),
            Self::File(path) => write!(formatter, "{}", path.display()),
        }
    }
}

impl TryFrom<String> for Destination {
    type Error = ConfigSchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.to_string()
    }
}

impl Serialize for Destination {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Logger configuration (v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggerConfig {
    /// Config schema version.
    pub version: u32,
    /// Application identity written under `type`.
    #[serde(rename = "type")]
    pub app_type: Box<str>,
    /// Logger class.
    pub context: LoggerClass,
    /// Minimum severity.
    pub level: Severity,
    /// Output destination.
    pub destination: Destination,
    /// Keys exempt from stringification.
    pub whitelist: Vec<Box<str>>,
    /// Error attributes consulted for `error_code`, in order.
    pub error_code_keys: Vec<Box<str>>,
    /// Key holding the record message.
    pub message_key: Box<str>,
    /// Key holding the timestamp.
    pub timestamp_key: Box<str>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            app_type: DEFAULT_APP_TYPE.into(),
            context: LoggerClass::App,
            level: Severity::Info,
            destination: Destination::Stdout,
            whitelist: Whitelist::default().iter().map(Box::from).collect(),
            error_code_keys: ErrorCodeKeys::default().iter().map(Box::from).collect(),
            message_key: "message".into(),
            timestamp_key: "time".into(),
        }
    }
}

impl LoggerConfig {
    /// Validate and normalize into a [`ValidatedLoggerConfig`].
    ///
    /// Trims identity and keys, removes duplicate list entries (first
    /// occurrence wins) and checks envelope keys against the reserved set.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedLoggerConfig, ConfigSchemaError> {
        validate_version(self.version)?;

        self.app_type = normalize_required(&self.app_type, "type")?;
        self.message_key = normalize_required(&self.message_key, "messageKey")?;
        self.timestamp_key = normalize_required(&self.timestamp_key, "timestampKey")?;
        validate_envelope_key("messageKey", &self.message_key)?;
        validate_envelope_key("timestampKey", &self.timestamp_key)?;
        if self.message_key == self.timestamp_key {
            return Err(ConfigSchemaError::DuplicateEnvelopeKey {
                key: self.message_key.to_string(),
            });
        }

        self.whitelist = normalize_key_list(self.whitelist, "whitelist", MAX_WHITELIST_KEYS)?;
        self.error_code_keys =
            normalize_key_list(self.error_code_keys, "errorCodeKeys", MAX_ERROR_CODE_KEYS)?;

        Ok(ValidatedLoggerConfig { raw: self })
    }
}

/// A config that passed validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLoggerConfig {
    raw: LoggerConfig,
}

impl ValidatedLoggerConfig {
    /// Borrow the normalized config.
    #[must_use]
    pub const fn as_ref(&self) -> &LoggerConfig {
        &self.raw
    }

    /// Consume into the normalized config.
    #[must_use]
    pub fn into_inner(self) -> LoggerConfig {
        self.raw
    }

    /// Serializer whitelist built from the config.
    #[must_use]
    pub fn whitelist(&self) -> Whitelist {
        Whitelist::new(self.raw.whitelist.iter().map(AsRef::<str>::as_ref))
    }

    /// Error code lookup keys built from the config.
    #[must_use]
    pub fn error_code_keys(&self) -> ErrorCodeKeys {
        ErrorCodeKeys::new(self.raw.error_code_keys.iter().map(AsRef::<str>::as_ref))
    }
}

impl AsRef<LoggerConfig> for ValidatedLoggerConfig {
    fn as_ref(&self) -> &LoggerConfig {
        &self.raw
    }
}

impl Deref for ValidatedLoggerConfig {
    type Target = LoggerConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse, validate and normalize a JSON config.
pub fn parse_logger_config_json(input: &str) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    let config: LoggerConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Parse, validate and normalize a TOML config.
pub fn parse_logger_config_toml(input: &str) -> Result<ValidatedLoggerConfig, ErrorEnvelope> {
    let config: LoggerConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Typed config validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// Unsupported schema version.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Supported version.
        supported: u32,
    },
    /// A required string was empty after trimming.
    EmptyField {
        /// Field name.
        field: &'static str,
    },
    /// A list exceeded its size limit.
    ListTooLarge {
        /// Field name.
        field: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A list entry was empty after trimming.
    EmptyListEntry {
        /// Field name.
        field: &'static str,
        /// Entry index.
        index: usize,
    },
    /// An envelope key collides with a key the engine writes itself.
    ReservedKey {
        /// Field name.
        field: &'static str,
        /// Offending key.
        key: String,
    },
    /// Message and timestamp keys are the same.
    DuplicateEnvelopeKey {
        /// Shared key.
        key: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::EmptyListEntry { .. } => ErrorCode::new("config", "empty_list_entry"),
            Self::ReservedKey { .. } => ErrorCode::new("config", "reserved_key"),
            Self::DuplicateEnvelopeKey { .. } => {
                ErrorCode::new("config", "duplicate_envelope_key")
            },
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version: {found} (supported: {supported})"
            ),
            Self::EmptyField { field } => write!(formatter, "{field} must be non-empty"),
            Self::ListTooLarge { field, len, max } => write!(
                formatter,
                "{field} must have at most {max} entries (got {len})"
            ),
            Self::EmptyListEntry { field, index } => {
                write!(formatter, "{field}[{index}] must be non-empty")
            },
            Self::ReservedKey { field, key } => {
                write!(formatter, "{field} uses reserved key `{key}`")
            },
            Self::DuplicateEnvelopeKey { key } => write!(
                formatter,
                "messageKey and timestampKey must differ (both `{key}`)"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::EmptyField { field } => envelope.with_metadata("field", field),
            ConfigSchemaError::ListTooLarge { field, len, max } => envelope
                .with_metadata("field", field)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::EmptyListEntry { field, index } => envelope
                .with_metadata("field", field)
                .with_metadata("index", index.to_string()),
            ConfigSchemaError::ReservedKey { field, key } => envelope
                .with_metadata("field", field)
                .with_metadata("key", key),
            ConfigSchemaError::DuplicateEnvelopeKey { key } => envelope.with_metadata("key", key),
        }
    }
}

const fn validate_version(version: u32) -> Result<(), ConfigSchemaError> {
    if version == CURRENT_CONFIG_VERSION {
        Ok(())
    } else {
        Err(ConfigSchemaError::UnsupportedVersion {
            found: version,
            supported: CURRENT_CONFIG_VERSION,
        })
    }
}

fn normalize_required(value: &str, field: &'static str) -> Result<Box<str>, ConfigSchemaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigSchemaError::EmptyField { field });
    }
    Ok(trimmed.into())
}

fn validate_envelope_key(field: &'static str, key: &str) -> Result<(), ConfigSchemaError> {
    if RESERVED_KEYS.contains(&key) {
        return Err(ConfigSchemaError::ReservedKey {
            field,
            key: key.to_string(),
        });
    }
    Ok(())
}

fn normalize_key_list(
    keys: Vec<Box<str>>,
    field: &'static str,
    max: usize,
) -> Result<Vec<Box<str>>, ConfigSchemaError> {
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ConfigSchemaError::EmptyListEntry { field, index });
        }
        if seen.insert(trimmed) {
            normalized.push(Box::from(trimmed));
        }
    }

    if normalized.len() > max {
        return Err(ConfigSchemaError::ListTooLarge {
            field,
            len: normalized.len(),
            max,
        });
    }
    Ok(normalized)
}
