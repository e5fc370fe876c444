//! # logshape-infra
//!
//! Composition root: turns a validated config into a ready logger.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger construction from validated configuration.
pub mod logger_factory;

pub use config_check::{
    load_effective_config, load_effective_config_json, load_effective_config_toml,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use logger_factory::{
    build_emitter, build_pipeline, create_logger, create_logger_with_sink, open_sink,
};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
