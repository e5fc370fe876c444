//! Flat-field stringification.
//!
//! Downstream indices type every field as text except a handful of strongly
//! typed keys, so each non-whitelisted value is replaced by its string form.
//! A value that cannot be rendered keeps its original shape.

use crate::fields::{FieldEncodeError, FieldMap, FieldValue};
use crate::reserved::{PID_KEY, TIME_KEY};
use serde_json::{Number, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Field names exempt from stringification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    keys: Arc<BTreeSet<Box<str>>>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new([TIME_KEY, PID_KEY])
    }
}

impl Whitelist {
    /// Build from field names.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Box<str>>,
    {
        Self {
            keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// True when `key` keeps its original type.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Iterate names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| &**key)
    }
}

/// Stringifies every non-whitelisted field of a flat map.
#[derive(Debug, Clone, Default)]
pub struct FieldSerializer {
    whitelist: Whitelist,
}

impl FieldSerializer {
    /// Create a serializer honouring `whitelist`.
    #[must_use]
    pub const fn new(whitelist: Whitelist) -> Self {
        Self { whitelist }
    }

    /// The exempt field names.
    #[must_use]
    pub const fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Serialize a field map. Key set and order are preserved.
    pub fn serialize(&self, fields: FieldMap) -> FieldMap {
        fields
            .into_iter()
            .map(|(key, value)| {
                if self.whitelist.contains(&key) {
                    return (key, value);
                }
                match stringify(&value) {
                    Ok(text) => (key, FieldValue::from(text)),
                    Err(error) => {
                        tracing::debug!(
                            target: "logshape",
                            field = %key,
                            reason = error.reason(),
                            "field left unstringified"
                        );
                        (key, value)
                    }
                }
            })
            .collect()
    }
}

/// String form of a single value.
pub fn stringify(value: &FieldValue) -> Result<String, FieldEncodeError> {
    match value {
        FieldValue::Json(json) => stringify_json(json),
        FieldValue::Function(source) => Ok(source.to_string()),
        FieldValue::Dynamic(dynamic) if dynamic.is_structured() => {
            let json = dynamic.to_json()?;
            stringify_json(&json)
        }
        FieldValue::Dynamic(dynamic) => dynamic.to_text(),
    }
}

fn stringify_json(value: &Value) -> Result<String, FieldEncodeError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok("null".to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number_text(number)),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).map_err(|error| FieldEncodeError::new(error.to_string()))
        }
    }
}

/// Integral floats print without a fractional part (`3.0` becomes `3`).
fn number_text(number: &Number) -> String {
    if number.is_f64()
        && let Some(float) = number.as_f64()
        && float.fract() == 0.0
        && float.abs() < 1e21
    {
        // `-0` prints as `0`.
        return format!("{:.0}", float + 0.0);
    }
    number.to_string()
}
