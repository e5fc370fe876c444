//! Logger facade over the record pipeline and an emitter.

use crate::pipeline::{CallShape, RecordPipeline};
use arc_swap::ArcSwap;
use logshape_domain::reserved::{CONTEXT_CLASS_KEY, IDENTITY_KEY};
use logshape_domain::{Context, FieldMap, LoggerClass, Severity};
use logshape_ports::EmitterPort;
use std::fmt;
use std::sync::Arc;

/// Construction properties of a root logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerProps {
    /// Application identity written under `type`.
    pub app_type: Box<str>,
    /// Logger class written under `context`.
    pub class: LoggerClass,
}

impl LoggerProps {
    /// Props for an application logger.
    pub fn app(app_type: impl Into<Box<str>>) -> Self {
        Self {
            app_type: app_type.into(),
            class: LoggerClass::App,
        }
    }

    /// Props for an access logger.
    pub fn access(app_type: impl Into<Box<str>>) -> Self {
        Self {
            app_type: app_type.into(),
            class: LoggerClass::Access,
        }
    }
}

/// A logger: context, class and identity in front of an emitter.
///
/// Context replacement is atomic; a call in flight keeps the snapshot it
/// started with.
pub struct Logger {
    pipeline: Arc<RecordPipeline>,
    emitter: Arc<dyn EmitterPort>,
    class: LoggerClass,
    identity: Arc<str>,
    context: ArcSwap<Context>,
}

impl Logger {
    /// Create a root logger whose context starts as `{type, context}`.
    #[must_use]
    pub fn new(
        props: LoggerProps,
        emitter: Arc<dyn EmitterPort>,
        pipeline: Arc<RecordPipeline>,
    ) -> Self {
        let initial = FieldMap::new()
            .with(IDENTITY_KEY, props.app_type.clone())
            .with(CONTEXT_CLASS_KEY, props.class.as_str());
        Self {
            pipeline,
            emitter,
            class: props.class,
            identity: Arc::from(props.app_type),
            context: ArcSwap::from_pointee(Context::create(initial)),
        }
    }

    /// Logger class.
    #[must_use]
    pub const fn class(&self) -> LoggerClass {
        self.class
    }

    /// Protected application identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Snapshot of the current context.
    #[must_use]
    pub fn context(&self) -> Arc<Context> {
        self.context.load_full()
    }

    /// Current minimum severity.
    #[must_use]
    pub fn level(&self) -> Severity {
        self.emitter.min_level()
    }

    /// Change the minimum severity of this logger.
    pub fn set_level(&self, severity: Severity) {
        self.emitter.set_min_level(severity);
    }

    /// Replace the context. The identity is still re-applied on every record.
    pub fn set_context(&self, fields: FieldMap) {
        self.context.store(Arc::new(Context::create(fields)));
    }

    /// Overlay `fields` onto the current context.
    pub fn add_context(&self, fields: FieldMap) {
        self.context.rcu(|current| current.merge(fields.clone()));
    }

    /// Child logger: context overlaid with `additions`, level copied, same
    /// destination. Later changes on either side stay local.
    #[must_use]
    pub fn child(&self, additions: FieldMap) -> Self {
        let context = self.context.load().for_child(additions);
        Self {
            pipeline: Arc::clone(&self.pipeline),
            emitter: self.emitter.child(),
            class: self.class,
            identity: Arc::clone(&self.identity),
            context: ArcSwap::from_pointee(context),
        }
    }

    /// Log at `severity`.
    pub fn log(&self, severity: Severity, shape: impl Into<CallShape>) {
        if !self.emitter.is_enabled(severity) {
            return;
        }
        let context = self.context.load();
        let record = self.pipeline.process(
            severity,
            shape.into(),
            &context,
            self.class,
            Some(&*self.identity),
        );
        self.emitter.emit(severity, record);
    }

    /// Log at trace.
    pub fn trace(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Trace, shape);
    }

    /// Log at debug.
    pub fn debug(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Debug, shape);
    }

    /// Log at info.
    pub fn info(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Info, shape);
    }

    /// Log at warn.
    pub fn warn(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Warn, shape);
    }

    /// Log at error.
    pub fn error(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Error, shape);
    }

    /// Log at fatal.
    pub fn fatal(&self, shape: impl Into<CallShape>) {
        self.log(Severity::Fatal, shape);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Logger")
            .field("class", &self.class)
            .field("identity", &self.identity)
            .field("level", &self.level())
            .field("context", &self.context.load_full())
            .finish_non_exhaustive()
    }
}
