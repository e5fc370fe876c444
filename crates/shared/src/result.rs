//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Error-side helpers for fallible I/O.
pub trait ResultExt<T, E> {
    /// Attach a metadata entry to the error, preserving the success.
    fn with_error_metadata(self, key: &str, value: &str) -> Result<T, ErrorEnvelope>
    where
        E: Into<ErrorEnvelope>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_error_metadata(self, key: &str, value: &str) -> Result<T, ErrorEnvelope>
    where
        E: Into<ErrorEnvelope>,
    {
        self.map_err(|error| error.into().with_metadata(key, value))
    }
}
