//! HTTP module for the chat-completion call
//!
//! This module implements the transport layer, handling:
//! - Client construction from the connection settings
//! - Bearer authentication and request correlation headers
//! - Mapping of error statuses into service-reported errors
//! - Response validation (content type, size) and decoding

pub mod client;
pub mod error;

use crate::config::EndpointConfig;
use crate::error::CompletionResult;
use crate::protocol::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Type of API call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// Chat completion request
    Chat,
}

impl CallKind {
    /// Get the endpoint path for this call kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            CallKind::Chat => "/chat/completions",
        }
    }
}

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Type of API call
    pub call_kind: CallKind,

    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Per-request timeout; the client-wide timeout applies when unset
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(CallKind::Chat)
    }
}

impl RequestOptions {
    /// Create new request options with a generated request ID
    pub fn new(call_kind: CallKind) -> Self {
        Self {
            call_kind,
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Trait for HTTP executors
///
/// Implementations send the request exactly once.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute a non-streaming JSON request
    async fn execute_json(
        &self,
        endpoint: &EndpointConfig,
        request: &ChatRequest,
        options: RequestOptions,
    ) -> CompletionResult<ChatResponse>;
}
