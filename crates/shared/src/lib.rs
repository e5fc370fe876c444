//! # logshape-shared
//!
//! Shared result types and error handling for the logshape workspace.
//!
//! - [`ErrorEnvelope`] carries a stable [`ErrorCode`], a kind, a message and
//!   string metadata for diagnostics.
//! - [`Result`] defaults its error type to [`ErrorEnvelope`].
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - All public types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod result;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
