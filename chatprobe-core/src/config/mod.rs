//! Configuration for the probe
//!
//! Defaults reproduce the fixed probe (routing endpoint, model and the two
//! prompts); the credential always comes from the environment or a file.
//! Files support `${VAR}` interpolation and are validated before use.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{
    apply_env_overrides, apply_overrides_with, interpolate_env_vars, interpolate_with,
    API_KEY_VAR, BASE_URL_VAR, MODEL_VAR,
};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ConnectionConfig, EndpointConfig, ProbeConfig, RequestConfig, CONFIG_VERSION,
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT,
};
pub use secrets::{SafeLogging, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Points at a YAML or JSON config file
pub const CONFIG_PATH_VAR: &str = "CHATPROBE_CONFIG";

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ProbeConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: ProbeConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ProbeConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: ProbeConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Defaults overlaid with `ROUTER_API_KEY`, `ROUTER_BASE_URL` and `ROUTER_MODEL`
pub fn from_env() -> ConfigResult<ProbeConfig> {
    let mut config = ProbeConfig::default();
    apply_env_overrides(&mut config);
    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Resolve the configuration the binary runs with
///
/// `CHATPROBE_CONFIG` selects a file (`.json` is parsed as JSON, anything
/// else as YAML); without it the environment is used.
pub fn load() -> ConfigResult<ProbeConfig> {
    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) if !path.trim().is_empty() => load_from_path(path.trim()),
        _ => from_env(),
    }
}

/// Load a file, picking the format from its extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<ProbeConfig> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    debug!("Loading configuration from {}", path.display());
    if is_json {
        load_from_json(path)
    } else {
        load_from_yaml(path)
    }
}

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    interpolate_env_vars(&content)
}
