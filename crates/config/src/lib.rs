//! # logshape-config
//!
//! Logger configuration schema, validation, env overrides and loading.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_APP_TYPE, Destination, LoggerConfig,
    MAX_ERROR_CODE_KEYS, MAX_WHITELIST_KEYS, ValidatedLoggerConfig, parse_logger_config_json,
    parse_logger_config_toml,
};

pub use env::{EnvParseError, LoggerEnv, apply_env_overrides};
pub use load::{
    load_logger_config_from_path, load_logger_config_from_sources, to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
