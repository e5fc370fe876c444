//! Logger classes.

use logshape_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logger class: structured application logs or raw pass-through access logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerClass {
    /// Structured class: fields are stringified and the level label is written.
    #[default]
    App,
    /// Pass-through class: fields keep their shape and no level label is written.
    Access,
}

impl LoggerClass {
    /// Lowercase class name written under the `context` key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Access => "access",
        }
    }

    /// True when records of this class run through the field serializer.
    #[must_use]
    pub const fn stringifies_fields(self) -> bool {
        matches!(self, Self::App)
    }

    /// True when records of this class carry a level label.
    #[must_use]
    pub const fn annotates_level(self) -> bool {
        matches!(self, Self::App)
    }
}

impl fmt::Display for LoggerClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unknown logger class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerClassParseError {
    input: String,
}

impl LoggerClassParseError {
    /// Raw input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for LoggerClassParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("logger class must be one of app, access")
    }
}

impl std::error::Error for LoggerClassParseError {}

impl From<LoggerClassParseError> for ErrorEnvelope {
    fn from(error: LoggerClassParseError) -> Self {
        Self::expected(ErrorCode::new("domain", "invalid_logger_class"), error.to_string())
            .with_metadata("input", error.input)
    }
}

impl FromStr for LoggerClass {
    type Err = LoggerClassParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "app" => Ok(Self::App),
            "access" => Ok(Self::Access),
            _ => Err(LoggerClassParseError {
                input: input.to_string(),
            }),
        }
    }
}
