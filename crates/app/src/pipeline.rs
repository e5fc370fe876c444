//! Record pipeline: call shape in, final record out.
//!
//! Per call, in order: resolve the call shape (normalizing any error), overlay
//! the fields on the logger context, relocate the raw stack, re-apply the
//! identity, stringify (app class only) and finally inject the level label.

use logshape_domain::reserved::{IDENTITY_KEY, LEVEL_KEY};
use logshape_domain::{
    Context, ErrorLike, ErrorNormalizer, ErrorPlacement, FieldMap, FieldSerializer, LevelTable,
    LoggerClass, NormalizedError, Severity, relocate_stack,
};
use logshape_ports::Record;

/// The argument shapes a log call can take.
#[derive(Debug, Clone, PartialEq)]
pub enum CallShape {
    /// A lone message.
    Scalar(Box<str>),
    /// Fields without a message.
    Fields(FieldMap),
    /// Fields and a message.
    FieldsAndMessage(FieldMap, Box<str>),
    /// Fields with an error in the message slot.
    FieldsAndError(FieldMap, ErrorLike),
    /// An error with a separate human message.
    ErrorAndMessage(ErrorLike, Box<str>),
    /// An error on its own; its message becomes the record message.
    BareError(ErrorLike),
}

impl From<&str> for CallShape {
    fn from(message: &str) -> Self {
        Self::Scalar(message.into())
    }
}

impl From<String> for CallShape {
    fn from(message: String) -> Self {
        Self::Scalar(message.into())
    }
}

impl From<FieldMap> for CallShape {
    fn from(fields: FieldMap) -> Self {
        Self::Fields(fields)
    }
}

impl From<ErrorLike> for CallShape {
    fn from(error: ErrorLike) -> Self {
        Self::BareError(error)
    }
}

impl From<(FieldMap, &str)> for CallShape {
    fn from((fields, message): (FieldMap, &str)) -> Self {
        Self::FieldsAndMessage(fields, message.into())
    }
}

impl From<(FieldMap, String)> for CallShape {
    fn from((fields, message): (FieldMap, String)) -> Self {
        Self::FieldsAndMessage(fields, message.into())
    }
}

impl From<(FieldMap, ErrorLike)> for CallShape {
    fn from((fields, error): (FieldMap, ErrorLike)) -> Self {
        Self::FieldsAndError(fields, error)
    }
}

impl From<(ErrorLike, &str)> for CallShape {
    fn from((error, message): (ErrorLike, &str)) -> Self {
        Self::ErrorAndMessage(error, message.into())
    }
}

impl From<(ErrorLike, String)> for CallShape {
    fn from((error, message): (ErrorLike, String)) -> Self {
        Self::ErrorAndMessage(error, message.into())
    }
}

/// Read-only tables driving the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RecordPipeline {
    level_table: LevelTable,
    serializer: FieldSerializer,
    normalizer: ErrorNormalizer,
}

impl RecordPipeline {
    /// Build a pipeline from its tables.
    #[must_use]
    pub const fn new(
        level_table: LevelTable,
        serializer: FieldSerializer,
        normalizer: ErrorNormalizer,
    ) -> Self {
        Self {
            level_table,
            serializer,
            normalizer,
        }
    }

    /// Level table in use.
    #[must_use]
    pub const fn level_table(&self) -> &LevelTable {
        &self.level_table
    }

    /// Field serializer in use.
    #[must_use]
    pub const fn serializer(&self) -> &FieldSerializer {
        &self.serializer
    }

    /// Error normalizer in use.
    #[must_use]
    pub const fn normalizer(&self) -> &ErrorNormalizer {
        &self.normalizer
    }

    /// Transform one call into the record handed to the emitter.
    pub fn process(
        &self,
        severity: Severity,
        shape: CallShape,
        context: &Context,
        class: LoggerClass,
        identity: Option<&str>,
    ) -> Record {
        let (fields, message) = self.resolve(shape);

        let mut merged = context.to_field_map();
        merged.overlay(fields);
        relocate_stack(&mut merged);
        if let Some(identity) = identity {
            merged.insert(IDENTITY_KEY, identity);
        }

        if class.stringifies_fields() {
            merged = self.serializer.serialize(merged);
        }
        self.pre_write(severity, class, &mut merged);

        Record::new(merged, message)
    }

    fn resolve(&self, shape: CallShape) -> (FieldMap, Option<Box<str>>) {
        let placement = match shape {
            CallShape::Scalar(message) => return (FieldMap::new(), Some(message)),
            CallShape::Fields(fields) => return (fields, None),
            CallShape::FieldsAndMessage(fields, message) => return (fields, Some(message)),
            CallShape::FieldsAndError(fields, error) => {
                ErrorPlacement::MessageSlot { fields, error }
            }
            CallShape::ErrorAndMessage(error, message) => ErrorPlacement::FieldSlot {
                error,
                message: Some(message),
            },
            CallShape::BareError(error) => ErrorPlacement::FieldSlot {
                error,
                message: None,
            },
        };
        let NormalizedError { fields, message } = self.normalizer.normalize(placement);
        (fields, Some(message))
    }

    /// Inject (or strip) the level label immediately before emission.
    fn pre_write(&self, severity: Severity, class: LoggerClass, fields: &mut FieldMap) {
        if !class.annotates_level() {
            fields.remove(LEVEL_KEY);
            return;
        }
        match self.level_table.label_for_severity(severity) {
            Some(label) => {
                fields.insert(LEVEL_KEY, label.as_str());
            }
            None => {
                tracing::debug!(
                    target: "logshape",
                    severity = severity.code(),
                    "severity has no level label"
                );
                fields.remove(LEVEL_KEY);
            }
        }
    }
}
