//! Environment variable interpolation and overrides for configuration

use super::error::ConfigError;
use super::schema::ProbeConfig;
use super::secrets::SecretString;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

/// Credential override
pub const API_KEY_VAR: &str = "ROUTER_API_KEY";
/// Base URL override
pub const BASE_URL_VAR: &str = "ROUTER_BASE_URL";
/// Model identifier override
pub const MODEL_VAR: &str = "ROUTER_MODEL";

/// `${NAME}` placeholders, upper-case names only
pub(crate) static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_with(content, |name| env::var(name).ok())
}

/// Interpolate placeholders using an arbitrary lookup
///
/// The first placeholder whose variable is missing is reported.
pub fn interpolate_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing: Option<String> = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match lookup(var_name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| var_name.to_string());
                cap[0].to_string()
            }
        }
    });

    if let Some(var) = missing {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}

/// Overlay `ROUTER_*` variables from the process environment
pub fn apply_env_overrides(config: &mut ProbeConfig) {
    apply_overrides_with(config, |name| env::var(name).ok());
}

/// Overlay `ROUTER_*` values from an arbitrary lookup; empty values are ignored
pub fn apply_overrides_with<F>(config: &mut ProbeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(key) = lookup(API_KEY_VAR) {
        config.endpoint.api_key = SecretString::new(key.trim());
    }
    if let Some(base_url) = lookup(BASE_URL_VAR) {
        config.endpoint.base_url = base_url.trim().to_string();
    }
    if let Some(model) = lookup(MODEL_VAR) {
        config.request.model = model.trim().to_string();
    }
}
