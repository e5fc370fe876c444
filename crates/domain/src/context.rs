//! Logger context: a persistent, copy-on-write field layer.

use crate::fields::{FieldMap, FieldValue};
use std::sync::Arc;

/// Base fields attached to a logger and inherited by its children.
///
/// Every change yields a new context; existing contexts (and children built
/// from them) never observe it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    fields: Arc<FieldMap>,
}

impl Context {
    /// Context holding exactly `initial`.
    #[must_use]
    pub fn create(initial: FieldMap) -> Self {
        Self {
            fields: Arc::new(initial),
        }
    }

    /// Empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// New context with `additions` overlaid (last writer wins).
    #[must_use]
    pub fn merge(&self, additions: FieldMap) -> Self {
        if additions.is_empty() {
            return self.clone();
        }
        let mut fields = (*self.fields).clone();
        fields.overlay(additions);
        Self::create(fields)
    }

    /// Context for a child logger: same overlay semantics as [`Context::merge`].
    #[must_use]
    pub fn for_child(&self, additions: FieldMap) -> Self {
        self.merge(additions)
    }

    /// Borrow the fields.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Copy of the fields, ready for per-call overlay.
    #[must_use]
    pub fn to_field_map(&self) -> FieldMap {
        (*self.fields).clone()
    }

    /// Value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// True when both contexts share the same storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }
}
