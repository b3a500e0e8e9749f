//! Configuration validation beyond the structural checks in the schema

use super::env::ENV_VAR_PATTERN;
use super::error::{ValidationError, ValidationErrorKind};
use super::schema::ProbeConfig;
use tracing::warn;

/// Configuration validator with additional validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ProbeConfig) -> Result<(), ValidationError> {
        config.validate()?;

        self.validate_placeholders(config)?;
        self.check_credential_shape(config);
        self.check_transport(config);

        Ok(())
    }

    /// A `${VAR}` that survived interpolation would be sent verbatim
    fn validate_placeholders(&self, config: &ProbeConfig) -> Result<(), ValidationError> {
        let fields = [
            ("endpoint.api_key", config.endpoint.api_key.expose_secret()),
            ("endpoint.base_url", config.endpoint.base_url.as_str()),
            ("request.model", config.request.model.as_str()),
        ];

        for (path, value) in fields {
            if let Some(m) = ENV_VAR_PATTERN.find(value) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::UnresolvedPlaceholder {
                        placeholder: m.as_str().to_string(),
                    },
                ));
            }
        }

        Ok(())
    }

    fn check_credential_shape(&self, config: &ProbeConfig) {
        let key = config.endpoint.api_key.expose_secret();
        if key.chars().any(char::is_whitespace) {
            warn!(
                "API key {} contains whitespace; the service will likely reject it",
                config.endpoint.api_key.partial_redact()
            );
        }
    }

    fn check_transport(&self, config: &ProbeConfig) {
        if let Ok(url) = url::Url::parse(&config.endpoint.base_url) {
            let local = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "::1" | "[::1]"));
            if url.scheme() == "http" && !local {
                warn!(
                    "Base URL {} is plain http; the bearer credential will travel unencrypted",
                    config.endpoint.base_url
                );
            }
        }
    }
}
