//! Severities and the numeric-to-label level table.

use logshape_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Call-site severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Trace.
    Trace,
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
    /// Fatal.
    Fatal,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Numeric severity code handed to the level table.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Trace => 10,
            Self::Debug => 20,
            Self::Info => 30,
            Self::Warn => 40,
            Self::Error => 50,
            Self::Fatal => 60,
        }
    }

    /// Inverse of [`Severity::code`].
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            10 => Some(Self::Trace),
            20 => Some(Self::Debug),
            30 => Some(Self::Info),
            40 => Some(Self::Warn),
            50 => Some(Self::Error),
            60 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Lowercase name, as accepted in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityParseError {
    input: String,
}

impl SeverityParseError {
    /// Raw input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for SeverityParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("severity must be one of trace, debug, info, warn, error, fatal")
    }
}

impl std::error::Error for SeverityParseError {}

impl From<SeverityParseError> for ErrorEnvelope {
    fn from(error: SeverityParseError) -> Self {
        Self::expected(ErrorCode::new("domain", "invalid_severity"), error.to_string())
            .with_metadata("input", error.input)
    }
}

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str() == normalized)
            .ok_or_else(|| SeverityParseError {
                input: input.to_string(),
            })
    }
}

/// Canonical uppercase level label written to records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelLabel {
    /// DEBUG (also used for trace severities).
    Debug,
    /// INFO.
    Info,
    /// WARN.
    Warn,
    /// ERROR.
    Error,
    /// FATAL.
    Fatal,
}

impl LevelLabel {
    /// Uppercase label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LevelLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Exact-match table from numeric severity code to label.
///
/// There is no interpolation between buckets: a code absent from the table
/// has no label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    entries: BTreeMap<u32, LevelLabel>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// The standard table: trace and debug both map to `DEBUG`.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries([
            (10, LevelLabel::Debug),
            (20, LevelLabel::Debug),
            (30, LevelLabel::Info),
            (40, LevelLabel::Warn),
            (50, LevelLabel::Error),
            (60, LevelLabel::Fatal),
        ])
    }

    /// Table holding exactly `entries`.
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, LevelLabel)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Add or replace a single mapping.
    #[must_use]
    pub fn with_entry(mut self, code: u32, label: LevelLabel) -> Self {
        self.entries.insert(code, label);
        self
    }

    /// Label for an exact numeric code.
    #[must_use]
    pub fn label_for_code(&self, code: u32) -> Option<LevelLabel> {
        self.entries.get(&code).copied()
    }

    /// Label for a severity, via its numeric code.
    #[must_use]
    pub fn label_for_severity(&self, severity: Severity) -> Option<LevelLabel> {
        self.label_for_code(severity.code())
    }

    /// Label for an untyped raw level: a number or a numeric string.
    ///
    /// Absent, non-numeric, fractional, negative and unmapped inputs all
    /// yield `None`.
    #[must_use]
    pub fn label_for(&self, raw: Option<&Value>) -> Option<LevelLabel> {
        raw.and_then(raw_level_code)
            .and_then(|code| self.label_for_code(code))
    }
}

fn raw_level_code(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && value.fract() == 0.0 && *value >= 0.0)
                    .map(|value| format!("{value:.0}"))
                    .and_then(|text| text.parse::<u64>().ok())
            })
            .and_then(|code| u32::try_from(code).ok()),
        Value::String(text) => text
            .parse::<u32>()
            .ok()
            .filter(|code| code.to_string() == *text),
        _ => None,
    }
}
