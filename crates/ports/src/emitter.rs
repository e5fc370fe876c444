//! Emission engine boundary contract.
//!
//! The record engine computes the final record; an emitter timestamps it,
//! encodes the envelope and writes it to a destination.

use logshape_domain::{FieldMap, Severity};
use std::sync::Arc;

/// A fully transformed record, ready to be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Final fields, in output order.
    pub fields: FieldMap,
    /// Record message; `None` when the call carried none.
    pub message: Option<Box<str>>,
}

impl Record {
    /// Record with fields and a message.
    #[must_use]
    pub fn new(fields: FieldMap, message: Option<Box<str>>) -> Self {
        Self { fields, message }
    }
}

/// Boundary contract for the emission engine.
pub trait EmitterPort: Send + Sync {
    /// Write one record at `severity`.
    ///
    /// Records below the minimum severity are discarded.
    fn emit(&self, severity: Severity, record: Record);

    /// Minimum severity written by this emitter.
    fn min_level(&self) -> Severity;

    /// Change the minimum severity.
    fn set_min_level(&self, severity: Severity);

    /// True when a record at `severity` would be written.
    fn is_enabled(&self, severity: Severity) -> bool {
        severity >= self.min_level()
    }

    /// Independent emitter sharing the destination; level changes on either
    /// side do not affect the other.
    fn child(&self) -> Arc<dyn EmitterPort>;
}
