//! Error-like values and their normalization into flat error fields.

use crate::fields::FieldMap;
use crate::reserved::{
    ERROR_CODE_KEY, ERROR_FILE_KEY, ERROR_LINE_KEY, ERROR_MESSAGE_KEY, ERROR_STACK_KEY,
};
use crate::trace::{ParsedTrace, parse_stack_trace};
use serde_json::{Map, Value};
use std::panic::Location;
use std::sync::Arc;

const DEFAULT_ERROR_NAME: &str = "Error";

/// An error as seen by the record engine: name, message, optional stack text
/// and arbitrary extra attributes (`code`, `statusCode`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorLike {
    name: Box<str>,
    message: Box<str>,
    stack: Option<Box<str>>,
    attributes: Map<String, Value>,
}

impl ErrorLike {
    /// Create an error whose stack points at the caller.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<Box<str>>) -> Self {
        Self::at(DEFAULT_ERROR_NAME.into(), message.into(), Location::caller())
    }

    /// Create an error with an explicit name (`TypeError`, `HttpError`, ...).
    #[must_use]
    #[track_caller]
    pub fn named(name: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self::at(name.into(), message.into(), Location::caller())
    }

    /// Capture a Rust error, folding its source chain into the message.
    #[must_use]
    #[track_caller]
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::at(DEFAULT_ERROR_NAME.into(), message.into(), Location::caller())
    }

    fn at(name: Box<str>, message: Box<str>, location: &Location<'_>) -> Self {
        let stack = format!(
            "{name}: {message}\n    at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
        Self {
            name,
            message,
            stack: Some(stack.into()),
            attributes: Map::new(),
        }
    }

    /// Replace (or clear) the stack text.
    #[must_use]
    pub fn with_stack(mut self, stack: Option<impl Into<Box<str>>>) -> Self {
        self.stack = stack.map(Into::into);
        self
    }

    /// Set the `code` attribute.
    #[must_use]
    pub fn with_code(self, code: impl Into<Value>) -> Self {
        self.with_attribute("code", code)
    }

    /// Set an arbitrary attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Error name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stack text, if any.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Extra attribute by name.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// First truthy code attribute in `keys` order.
    #[must_use]
    pub fn code(&self, keys: &ErrorCodeKeys) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.attributes.get(key))
            .find(|value| is_present_code(value))
    }

    /// Parse the stack and attach the resolved code.
    #[must_use]
    pub fn parse(&self, keys: &ErrorCodeKeys) -> ParsedTrace {
        parse_stack_trace(self.stack()).with_code(self.code(keys).cloned())
    }
}

impl std::fmt::Display for ErrorLike {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.name, self.message)
    }
}

fn is_present_code(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|code| code != 0.0),
        Value::String(text) => !matches!(text.as_str(), "" | "null" | "undefined"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ordered attribute names consulted for an error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeKeys {
    keys: Arc<[Box<str>]>,
}

impl Default for ErrorCodeKeys {
    fn default() -> Self {
        Self::new(["code", "statusCode", "status"])
    }
}

impl ErrorCodeKeys {
    /// Build from an ordered list of attribute names.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Box<str>>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterate names in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| &**key)
    }
}

/// Where the error sat in the call.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPlacement {
    /// Error in the field slot, with an optional separate human message.
    FieldSlot {
        /// The error.
        error: ErrorLike,
        /// Human message supplied next to the error.
        message: Option<Box<str>>,
    },
    /// Error in the message slot, next to an unrelated field map.
    MessageSlot {
        /// Call-time fields.
        fields: FieldMap,
        /// The error.
        error: ErrorLike,
    },
}

/// Fields and message resolved from an error placement.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    /// Fields to merge into the record.
    pub fields: FieldMap,
    /// Resolved record message.
    pub message: Box<str>,
}

/// Turns error placements into flat `error_*` fields.
#[derive(Debug, Clone, Default)]
pub struct ErrorNormalizer {
    code_keys: ErrorCodeKeys,
}

impl ErrorNormalizer {
    /// Create a normalizer consulting `code_keys` for error codes.
    #[must_use]
    pub const fn new(code_keys: ErrorCodeKeys) -> Self {
        Self { code_keys }
    }

    /// Attribute names consulted for error codes.
    #[must_use]
    pub const fn code_keys(&self) -> &ErrorCodeKeys {
        &self.code_keys
    }

    /// Normalize one placement.
    pub fn normalize(&self, placement: ErrorPlacement) -> NormalizedError {
        match placement {
            ErrorPlacement::FieldSlot {
                error,
                message: Some(message),
            } => {
                let mut fields = FieldMap::new().with(ERROR_MESSAGE_KEY, error.message());
                fields.overlay(self.common_fields(&error));
                NormalizedError { fields, message }
            }
            ErrorPlacement::FieldSlot {
                error,
                message: None,
            } => NormalizedError {
                fields: self.common_fields(&error),
                message: error.message,
            },
            ErrorPlacement::MessageSlot { mut fields, error } => {
                fields.overlay(self.common_fields(&error));
                NormalizedError {
                    fields,
                    message: error.message,
                }
            }
        }
    }

    fn common_fields(&self, error: &ErrorLike) -> FieldMap {
        let parsed = error.parse(&self.code_keys);
        let mut fields = FieldMap::new();
        if let Some(stack) = parsed.stack_trace() {
            fields.insert(ERROR_STACK_KEY, stack);
        }
        if let Some(location) = parsed.location() {
            fields.insert(ERROR_FILE_KEY, location.file_name());
            fields.insert(ERROR_LINE_KEY, location.line_number());
        }
        if let Some(code) = parsed.code() {
            fields.insert(ERROR_CODE_KEY, code.clone());
        }
        fields
    }
}
