//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::{SafeLogging, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The only schema version this build understands
pub const CONFIG_VERSION: &str = "0.1";

/// Routing endpoint used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://router.requesty.ai/v1";

/// Model identifier used when none is configured
pub const DEFAULT_MODEL: &str = "cline/o3-mini:high";

/// Fixed system prompt of the probe conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Fixed user prompt of the probe conversation
pub const DEFAULT_USER_PROMPT: &str = "Hello! How can you help me today?";

/// Root configuration structure for the probe
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Where to send the request and how to authenticate
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// What to send
    #[serde(default)]
    pub request: RequestConfig,

    /// HTTP connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Routing endpoint and credential
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Base URL; the chat-completions path is appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential (supports environment variable interpolation)
    #[serde(default)]
    pub api_key: SecretString,
}

/// The conversation sent by the probe
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,

    /// Sampling temperature, omitted from the request when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Completion token cap, omitted from the request when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            endpoint: EndpointConfig::default(),
            request: RequestConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: SecretString::default(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
        }
    }
}

// Default value functions for serde
fn default_version() -> String { CONFIG_VERSION.to_string() }
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_system_prompt() -> String { DEFAULT_SYSTEM_PROMPT.to_string() }
fn default_user_prompt() -> String { DEFAULT_USER_PROMPT.to_string() }
fn default_connect_timeout() -> u64 { 10_000 }
fn default_request_timeout() -> u64 { 600_000 }
fn default_max_idle() -> usize { 10 }

impl ProbeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.endpoint.validate("endpoint")?;
        self.request.validate("request")?;
        self.connection.validate("connection")?;

        Ok(())
    }
}

impl EndpointConfig {
    /// Validate endpoint configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::required(format!("{}.api_key", path))
                .with_context("set ROUTER_API_KEY or endpoint.api_key"));
        }

        if self.base_url.is_empty() {
            return Err(ValidationError::required(format!("{}.base_url", path)));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        format!("{}.base_url", path),
                        format!("URL scheme must be http or https, got: {}", url.scheme()),
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid_url(
                    format!("{}.base_url", path),
                    e.to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Full URL for an endpoint path such as `/chat/completions`
    pub fn url_for(&self, endpoint_path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint_path)
    }
}

impl RequestConfig {
    /// Validate request configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }
        if self.system_prompt.is_empty() {
            return Err(ValidationError::required(format!("{}.system_prompt", path)));
        }
        if self.user_prompt.is_empty() {
            return Err(ValidationError::required(format!("{}.user_prompt", path)));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ValidationError::out_of_range(
                    format!("{}.temperature", path),
                    format!("Temperature must be between 0.0 and 2.0, got {}", temperature),
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ValidationError::out_of_range(
                format!("{}.max_tokens", path),
                "max_tokens must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Timeout must be greater than 0",
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Timeout must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl SafeLogging for ProbeConfig {
    fn safe_for_logging(&self) -> String {
        format!(
            "base_url={} api_key={} model={} connect_timeout_ms={} request_timeout_ms={}",
            self.endpoint.base_url,
            self.endpoint.api_key.partial_redact(),
            self.request.model,
            self.connection.connect_timeout_ms,
            self.connection.request_timeout_ms,
        )
    }
}
