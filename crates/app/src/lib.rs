//! # logshape-app
//!
//! The record pipeline and the logger facade built on it.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod logger;
pub mod pipeline;

pub use logger::{Logger, LoggerProps};
pub use pipeline::{CallShape, RecordPipeline};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
