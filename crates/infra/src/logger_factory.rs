//! Logger construction from validated configuration.

use crate::InfraResult;
use logshape_adapters::{FileLogSink, JsonEmitter, LogSink, StderrLogSink, StdoutLogSink};
use logshape_app::{Logger, LoggerProps, RecordPipeline};
use logshape_config::{Destination, ValidatedLoggerConfig};
use logshape_domain::{ErrorNormalizer, FieldSerializer, LevelTable};
use std::sync::Arc;

/// Build the pipeline tables described by the config.
#[must_use]
pub fn build_pipeline(config: &ValidatedLoggerConfig) -> RecordPipeline {
    RecordPipeline::new(
        LevelTable::standard(),
        FieldSerializer::new(config.whitelist()),
        ErrorNormalizer::new(config.error_code_keys()),
    )
}

/// Open the configured destination.
pub fn open_sink(destination: &Destination) -> InfraResult<Arc<dyn LogSink>> {
    let sink: Arc<dyn LogSink> = match destination {
        Destination::Stdout => Arc::new(StdoutLogSink),
        Destination::Stderr => Arc::new(StderrLogSink),
        Destination::File(path) => Arc::new(FileLogSink::open(path)?),
    };
    Ok(sink)
}

/// Build the JSON emitter for `sink` with the configured level and keys.
#[must_use]
pub fn build_emitter(config: &ValidatedLoggerConfig, sink: Arc<dyn LogSink>) -> JsonEmitter {
    JsonEmitter::new(sink)
        .with_min_level(config.level)
        .with_message_key(&*config.message_key)
        .with_timestamp_key(&*config.timestamp_key)
}

/// Create the root logger: opens the destination and wires the pipeline.
pub fn create_logger(config: &ValidatedLoggerConfig) -> InfraResult<Logger> {
    let sink = open_sink(&config.destination)?;
    tracing::debug!(
        target: "logshape",
        destination = %config.destination,
        class = config.context.as_str(),
        level = %config.level,
        "logger created"
    );
    Ok(create_logger_with_sink(config, sink))
}

/// Create the root logger writing to an already opened sink.
#[must_use]
pub fn create_logger_with_sink(config: &ValidatedLoggerConfig, sink: Arc<dyn LogSink>) -> Logger {
    let props = LoggerProps {
        app_type: config.app_type.clone(),
        class: config.context,
    };
    Logger::new(
        props,
        Arc::new(build_emitter(config, sink)),
        Arc::new(build_pipeline(config)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use logshape_config::LoggerConfig;
    use logshape_domain::Severity;

    #[test]
    fn pipeline_uses_configured_tables() -> Result<(), Box<dyn std::error::Error>> {
        let config = LoggerConfig {
            whitelist: vec!["latency_ms".into()],
            error_code_keys: vec!["status".into()],
            ..LoggerConfig::default()
        }
        .validate_and_normalize()?;

        let pipeline = build_pipeline(&config);
        assert!(pipeline.serializer().whitelist().contains("latency_ms"));
        assert!(!pipeline.serializer().whitelist().contains("time"));
        assert_eq!(
            pipeline.normalizer().code_keys().iter().collect::<Vec<_>>(),
            vec!["status"]
        );
        Ok(())
    }

    #[test]
    fn logger_takes_identity_class_and_level() -> Result<(), Box<dyn std::error::Error>> {
        let config = LoggerConfig {
            app_type: "svc".into(),
            level: Severity::Error,
            ..LoggerConfig::default()
        }
        .validate_and_normalize()?;

        let sink = Arc::new(logshape_adapters::MemoryLogSink::default());
        let logger = create_logger_with_sink(&config, sink);
        assert_eq!(logger.identity(), "svc");
        assert_eq!(logger.level(), Severity::Error);
        Ok(())
    }
}
