//! # logshape-adapters
//!
//! Adapter implementations for ports: the JSON emission engine and the
//! destinations it writes to. This crate depends on `ports` and `shared`.

pub mod json_emitter;
pub mod log_sink;

pub use json_emitter::{JsonEmitter, UNSERIALIZABLE};
pub use log_sink::{FileLogSink, LogSink, MemoryLogSink, StderrLogSink, StdoutLogSink};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
