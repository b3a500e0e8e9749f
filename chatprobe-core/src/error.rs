//! Error taxonomy for a completion call
//!
//! Failures fall into exactly two buckets. A service-reported error is a
//! non-2xx answer from the endpoint and carries its status and structured
//! body; everything else (configuration, transport, decoding) is
//! unexpected. The bucket is a variant tag, queried through
//! [`CompletionError::class`].

use crate::config::ConfigError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Result type for completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Which of the two buckets an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The service answered with an error status
    Api,
    /// Anything else
    Unexpected,
}

/// Any failure of a probe
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Unexpected(#[from] UnexpectedError),
}

impl CompletionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Api(_) => ErrorClass::Api,
            Self::Unexpected(_) => ErrorClass::Unexpected,
        }
    }

    pub fn is_api_error(&self) -> bool {
        self.class() == ErrorClass::Api
    }

    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Unexpected(_) => None,
        }
    }
}

impl From<ConfigError> for CompletionError {
    fn from(err: ConfigError) -> Self {
        Self::Unexpected(UnexpectedError::Configuration(err))
    }
}

/// Coarse category of a service-reported error, derived from the status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Authentication,
    PermissionDenied,
    NotFound,
    Conflict,
    UnprocessableEntity,
    RateLimit,
    InternalServer,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::RateLimit,
            500..=599 => Self::InternalServer,
            _ => Self::Other,
        }
    }
}

/// Error reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,

    pub kind: ApiErrorKind,

    /// Human-readable message from the error body
    pub message: String,

    /// `error.type` from the body, if any
    pub error_type: Option<String>,

    /// `error.code` from the body, if any
    pub code: Option<String>,

    /// `error.param` from the body, if any
    pub param: Option<String>,

    /// How long the service asked us to wait; informational only
    pub retry_after: Option<Duration>,

    /// Correlation ID sent with the request
    pub request_id: Uuid,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)?;

        match (&self.error_type, &self.code) {
            (Some(t), Some(c)) => write!(f, " (type: {}, code: {})", t, c)?,
            (Some(t), None) => write!(f, " (type: {})", t)?,
            (None, Some(c)) => write!(f, " (code: {})", c)?,
            (None, None) => {}
        }

        if let Some(param) = &self.param {
            write!(f, " [param: {}]", param)?;
        }
        if let Some(retry_after) = self.retry_after {
            write!(f, " [retry after {}s]", retry_after.as_secs())?;
        }

        write!(f, " [request_id: {}]", self.request_id)
    }
}

impl std::error::Error for ApiError {}

/// Everything that is not a service-reported error
#[derive(Debug, Error)]
pub enum UnexpectedError {
    #[error("Configuration error: {0}")]
    Configuration(#[source] ConfigError),

    #[error("Failed to create HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out [request_id: {request_id}]")]
    Timeout { request_id: Uuid },

    #[error("Expected application/json, got: {content_type} [request_id: {request_id}]")]
    InvalidContentType {
        content_type: String,
        request_id: Uuid,
    },

    #[error("Response size {size} exceeds maximum {max} [request_id: {request_id}]")]
    ResponseTooLarge {
        size: usize,
        max: usize,
        request_id: Uuid,
    },

    #[error("Invalid response format: {message}")]
    Decode { message: String },

    #[error("Failed to serialize request: {message}")]
    Serialization { message: String },

    #[error("Response contained no choices [request_id: {request_id}]")]
    EmptyChoices { request_id: Uuid },
}
