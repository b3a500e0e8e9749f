//! Errors raised while loading a probe configuration

use std::fmt;
use thiserror::Error;

/// Why a configuration could not be produced
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Environment variable '{var}' not found")]
    EnvVarNotFound { var: String },
}

/// A rejected setting, addressed by its dotted path (`endpoint.api_key`)
#[derive(Debug, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Hint for fixing the setting
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(hint) = &self.context {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("required field is missing")]
    RequiredFieldMissing,

    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("unsupported config version {actual} (this build reads {expected})")]
    InvalidVersion { expected: String, actual: String },

    #[error("unresolved environment placeholder: {placeholder}")]
    UnresolvedPlaceholder { placeholder: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, hint: impl Into<String>) -> Self {
        self.context = Some(hint.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidUrl {
                message: message.into(),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
