//! Field values and the ordered field map carried by every record.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Failure raised when a dynamic field cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEncodeError {
    reason: Box<str>,
}

impl FieldEncodeError {
    /// Create an encode error with a human-readable reason.
    pub fn new(reason: impl Into<Box<str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for FieldEncodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "field could not be encoded: {}", self.reason)
    }
}

impl std::error::Error for FieldEncodeError {}

/// A caller-supplied value whose encoding is computed on demand and may fail.
///
/// Cyclic graphs, handles to external resources and other exotic values
/// implement this to take part in a record without forcing an eager
/// conversion at the call site.
pub trait DynamicField: Send + Sync + fmt::Debug {
    /// True when the value is object- or array-like and renders as JSON text.
    fn is_structured(&self) -> bool;

    /// Encode the value as JSON.
    fn to_json(&self) -> Result<Value, FieldEncodeError>;

    /// Render the value as plain text.
    fn to_text(&self) -> Result<String, FieldEncodeError>;
}

/// A single raw field value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Plain JSON data (scalars, objects, arrays).
    Json(Value),
    /// A callable captured by its source text.
    Function(Arc<str>),
    /// A lazily encoded value.
    Dynamic(Arc<dyn DynamicField>),
}

impl FieldValue {
    /// Build a function value from its source text.
    pub fn function(source: impl Into<Arc<str>>) -> Self {
        Self::Function(source.into())
    }

    /// Wrap a dynamic value.
    pub fn dynamic(value: impl DynamicField + 'static) -> Self {
        Self::Dynamic(Arc::new(value))
    }

    /// Borrow the JSON payload, if any.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Function(_) | Self::Dynamic(_) => None,
        }
    }

    /// Borrow the value as a string slice when it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Encode the value as JSON for the emission engine.
    ///
    /// Functions encode as their source text.
    pub fn encode(&self) -> Result<Value, FieldEncodeError> {
        match self {
            Self::Json(value) => Ok(value.clone()),
            Self::Function(source) => Ok(Value::String(source.to_string())),
            Self::Dynamic(value) => value.to_json(),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Json(left), Self::Json(right)) => left == right,
            (Self::Function(left), Self::Function(right)) => left == right,
            (Self::Dynamic(left), Self::Dynamic(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_owned()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<Box<str>> for FieldValue {
    fn from(value: Box<str>) -> Self {
        Self::Json(Value::String(value.into_string()))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Json(Value::from(value))
    }
}

/// Ordered mapping of field name to raw value.
///
/// Keys keep their first-insertion position; re-inserting a key replaces the
/// value in place, so overlays behave like an object spread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(Box<str>, FieldValue)>,
}

impl FieldMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<Box<str>>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Build a map from a JSON object, keeping its key order.
    #[must_use]
    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        object.into_iter().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.position(key)
            .and_then(|index| self.entries.get(index))
            .map(|(_, value)| value)
    }

    /// True when the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<Box<str>>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        if let Some((_, slot)) = self
            .position(&key)
            .and_then(|index| self.entries.get_mut(index))
        {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.position(key)
            .map(|index| self.entries.remove(index))
            .map(|(_, value)| value)
    }

    /// Overlay another map onto this one (last writer wins).
    pub fn overlay(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (&**key, value))
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| &**key)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| &**existing == key)
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<Box<str>>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for FieldMap
where
    K: Into<Box<str>>,
    V: Into<FieldValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for FieldMap {
    type Item = (Box<str>, FieldValue);
    type IntoIter = std::vec::IntoIter<(Box<str>, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
