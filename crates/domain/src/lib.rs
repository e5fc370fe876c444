//! # logshape-domain
//!
//! The record transformation engine: everything that turns call-site
//! arguments into a flat, index-safe record, with no I/O.
//!
//! - **Fields** - `FieldValue`, `FieldMap`, `DynamicField`
//! - **Levels** - `Severity`, `LevelLabel`, `LevelTable`
//! - **Traces** - `parse_stack_trace`, `ParsedTrace`
//! - **Errors** - `ErrorLike`, `ErrorNormalizer`, `ErrorCodeKeys`
//! - **Serializer** - `FieldSerializer`, `Whitelist`
//! - **Context** - `Context`, `LoggerClass`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Never fails outward: degraded paths emit `tracing` diagnostics instead

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use logshape_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod class;
pub mod context;
pub mod error_info;
pub mod fields;
pub mod level;
pub mod reserved;
pub mod serializer;
pub mod trace;

pub use class::{LoggerClass, LoggerClassParseError};
pub use context::Context;
pub use error_info::{ErrorCodeKeys, ErrorLike, ErrorNormalizer, ErrorPlacement, NormalizedError};
pub use fields::{DynamicField, FieldEncodeError, FieldMap, FieldValue};
pub use level::{LevelLabel, LevelTable, Severity, SeverityParseError};
pub use reserved::relocate_stack;
pub use serializer::{FieldSerializer, Whitelist, stringify};
pub use trace::{FrameLocation, ParsedTrace, parse_stack_trace};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
