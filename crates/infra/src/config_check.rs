//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use logshape_config::{
    LoggerEnv, ValidatedLoggerConfig, load_logger_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use logshape_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from an env map, a file and overrides.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedLoggerConfig> {
    let env = LoggerEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_logger_config_from_path(config_path, overrides_json, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_json(&config)
}

/// Load and validate the effective config, returning deterministic pretty TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_toml(&config)
}
