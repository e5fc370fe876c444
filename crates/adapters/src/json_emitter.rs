//! JSON-lines emission engine.

use crate::log_sink::LogSink;
use logshape_ports::{EmitterPort, FieldValue, Record, Severity};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Placeholder written for values whose encoding fails.
pub const UNSERIALIZABLE: &str = "[unserializable]";

const STACK_KEY: &str = "stack";

/// Emitter writing one JSON object per record:
/// `{"<time>":<epoch ms>, ...fields, "<message>":<text>}`.
pub struct JsonEmitter {
    sink: Arc<dyn LogSink>,
    min_level: AtomicU32,
    message_key: Arc<str>,
    timestamp_key: Arc<str>,
    clock: fn() -> u64,
}

impl JsonEmitter {
    /// Create an emitter backed by the provided sink, writing `info` and above.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_level: AtomicU32::new(Severity::Info.code()),
            message_key: Arc::from("message"),
            timestamp_key: Arc::from("time"),
            clock: now_epoch_ms,
        }
    }

    /// Set the minimum severity.
    #[must_use]
    pub fn with_min_level(self, severity: Severity) -> Self {
        self.min_level.store(severity.code(), Ordering::Relaxed);
        self
    }

    /// Set the key holding the record message.
    #[must_use]
    pub fn with_message_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Set the key holding the timestamp.
    #[must_use]
    pub fn with_timestamp_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.timestamp_key = key.into();
        self
    }

    /// Replace the millisecond clock.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    fn encode(&self, record: Record) -> String {
        let mut payload = Map::new();
        payload.insert(self.timestamp_key.to_string(), Value::from((self.clock)()));

        for (key, value) in record.fields {
            if &*key == STACK_KEY {
                continue;
            }
            let encoded = encode_field(&key, &value);
            payload.insert(key.into_string(), encoded);
        }
        if let Some(message) = record.message {
            payload.insert(self.message_key.to_string(), Value::String(message.into_string()));
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |error| {
                tracing::warn!(target: "logshape", %error, "record serialization failed");
                format!(
                    "{{\"{}\":0,\"{}\":\"log serialization failed\"}}\n",
                    self.timestamp_key, self.message_key
                )
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }
}

impl std::fmt::Debug for JsonEmitter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("JsonEmitter")
            .field("min_level", &self.min_level())
            .field("message_key", &self.message_key)
            .field("timestamp_key", &self.timestamp_key)
            .finish_non_exhaustive()
    }
}

impl EmitterPort for JsonEmitter {
    fn emit(&self, severity: Severity, record: Record) {
        if !self.is_enabled(severity) {
            return;
        }
        let line = self.encode(record);
        self.sink.write_line(&line);
    }

    fn min_level(&self) -> Severity {
        Severity::from_code(self.min_level.load(Ordering::Relaxed)).unwrap_or(Severity::Info)
    }

    fn set_min_level(&self, severity: Severity) {
        self.min_level.store(severity.code(), Ordering::Relaxed);
    }

    fn child(&self) -> Arc<dyn EmitterPort> {
        Arc::new(Self {
            sink: Arc::clone(&self.sink),
            min_level: AtomicU32::new(self.min_level.load(Ordering::Relaxed)),
            message_key: Arc::clone(&self.message_key),
            timestamp_key: Arc::clone(&self.timestamp_key),
            clock: self.clock,
        })
    }
}

fn encode_field(key: &str, value: &FieldValue) -> Value {
    value.encode().unwrap_or_else(|error| {
        tracing::debug!(
            target: "logshape",
            field = key,
            reason = error.reason(),
            "field written as placeholder"
        );
        Value::String(UNSERIALIZABLE.to_string())
    })
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use logshape_ports::{DynamicField, FieldEncodeError, FieldMap};
    use serde_json::json;

    const fn fixed_clock() -> u64 {
        1_700_000_000_000
    }

    #[derive(Debug)]
    struct Broken;

    impl DynamicField for Broken {
        fn is_structured(&self) -> bool {
            true
        }

        fn to_json(&self) -> Result<Value, FieldEncodeError> {
            Err(FieldEncodeError::new("cycle"))
        }

        fn to_text(&self) -> Result<String, FieldEncodeError> {
            Err(FieldEncodeError::new("cycle"))
        }
    }

    fn emitter(sink: &Arc<MemoryLogSink>) -> JsonEmitter {
        JsonEmitter::new(sink.clone()).with_clock(fixed_clock)
    }

    #[test]
    fn writes_time_fields_then_message() {
        let sink = Arc::new(MemoryLogSink::default());
        emitter(&sink).emit(
            Severity::Info,
            Record::new(
                FieldMap::new().with("type", "svc").with("loglevel", "INFO"),
                Some("hello".into()),
            ),
        );

        let lines = sink.take();
        assert_eq!(
            lines,
            vec![
                "{\"time\":1700000000000,\"type\":\"svc\",\"loglevel\":\"INFO\",\"message\":\"hello\"}\n"
            ]
        );
    }

    #[test]
    fn filters_below_minimum_level() {
        let sink = Arc::new(MemoryLogSink::default());
        let emitter = emitter(&sink).with_min_level(Severity::Warn);

        emitter.emit(Severity::Info, Record::default());
        emitter.emit(Severity::Error, Record::default());
        assert_eq!(sink.take().len(), 1);

        emitter.set_min_level(Severity::Trace);
        emitter.emit(Severity::Trace, Record::default());
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn strips_raw_stack_and_omits_absent_message() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        emitter(&sink).emit(
            Severity::Error,
            Record::new(FieldMap::new().with("stack", "raw").with("a", 1), None),
        );

        let lines = sink.take();
        let payload: Value = serde_json::from_str(lines.first().map_or("", |line| line.trim()))?;
        assert_eq!(payload, json!({ "time": 1_700_000_000_000_u64, "a": 1 }));
        Ok(())
    }

    #[test]
    fn child_copies_level_and_shares_sink() {
        let sink = Arc::new(MemoryLogSink::default());
        let parent = emitter(&sink).with_min_level(Severity::Warn);
        let child = parent.child();

        assert_eq!(child.min_level(), Severity::Warn);
        child.set_min_level(Severity::Debug);
        assert_eq!(parent.min_level(), Severity::Warn);

        child.emit(Severity::Debug, Record::default());
        parent.emit(Severity::Debug, Record::default());
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn custom_keys_and_unencodable_values() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        emitter(&sink)
            .with_message_key("msg")
            .with_timestamp_key("ts")
            .emit(
                Severity::Info,
                Record::new(
                    FieldMap::new().with("loop", FieldValue::dynamic(Broken)),
                    Some("m".into()),
                ),
            );

        let lines = sink.take();
        let payload: Value = serde_json::from_str(lines.first().map_or("", |line| line.trim()))?;
        assert_eq!(
            payload,
            json!({ "ts": 1_700_000_000_000_u64, "loop": UNSERIALIZABLE, "msg": "m" })
        );
        Ok(())
    }
}
