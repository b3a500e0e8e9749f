//! HTTP client implementation using reqwest

use crate::config::{ConnectionConfig, EndpointConfig};
use crate::error::{CompletionResult, UnexpectedError};
use crate::http::{HttpExecutor, RequestOptions};
use crate::protocol::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("chatprobe/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new() -> CompletionResult<Self> {
        Self::from_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    pub fn from_config(connection: &ConnectionConfig) -> CompletionResult<Self> {
        Self::with_config(
            connection.connect_timeout(),
            connection.request_timeout(),
            connection.max_idle_per_host,
        )
    }

    /// Create a new HTTP client with explicit timeouts and pool size
    pub fn with_config(
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> CompletionResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| UnexpectedError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Lower the response size cap
    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }

    /// Validate response content type
    fn validate_content_type(
        response: &Response,
        options: &RequestOptions,
    ) -> CompletionResult<()> {
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type_str = content_type.to_str().unwrap_or("").to_lowercase();

            if !content_type_str.contains("application/json") {
                return Err(UnexpectedError::InvalidContentType {
                    content_type: content_type_str,
                    request_id: options.request_id,
                }
                .into());
            }
        }

        Ok(())
    }

    /// Check declared response size to prevent OOM
    fn check_content_length(
        &self,
        response: &Response,
        options: &RequestOptions,
    ) -> CompletionResult<()> {
        if let Some(content_length) = response.content_length() {
            let size = usize::try_from(content_length).unwrap_or(usize::MAX);
            if size > self.max_response_size {
                return Err(UnexpectedError::ResponseTooLarge {
                    size,
                    max: self.max_response_size,
                    request_id: options.request_id,
                }
                .into());
            }
        }

        Ok(())
    }

    /// Read at most `max_response_size` bytes of an error body
    async fn read_error_body(&self, mut response: Response, request_id: Uuid) -> Option<String> {
        let limit = self.max_response_size;
        if let Some(content_length) = response.content_length() {
            if usize::try_from(content_length).map_or(true, |size| size > limit) {
                warn!(
                    "Error body of {} bytes exceeds {}, truncating [request_id: {}]",
                    content_length, limit, request_id
                );
            }
        }

        let mut buf: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = limit - buf.len();
                    if chunk.len() >= room {
                        buf.extend_from_slice(&chunk[..room]);
                        break;
                    }
                    buf.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Failed to read error body [request_id: {}]: {}", request_id, e);
                    if buf.is_empty() {
                        return None;
                    }
                    break;
                }
            }
        }

        Some(String::from_utf8_lossy(&buf).into_owned())
    }

    fn map_send_error(err: reqwest::Error, options: &RequestOptions) -> UnexpectedError {
        let request_id = options.request_id;
        if err.is_timeout() {
            warn!("Request timeout [request_id: {}]", request_id);
            UnexpectedError::Timeout { request_id }
        } else if err.is_connect() {
            error!("Connection error [request_id: {}]: {}", request_id, err);
            UnexpectedError::Network {
                message: format!("Connection failed: {} [request_id: {}]", err, request_id),
            }
        } else {
            error!("Request error [request_id: {}]: {}", request_id, err);
            UnexpectedError::Network {
                message: format!("{} [request_id: {}]", err, request_id),
            }
        }
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn execute_json(
        &self,
        endpoint: &EndpointConfig,
        request: &ChatRequest,
        options: RequestOptions,
    ) -> CompletionResult<ChatResponse> {
        let request_id = options.request_id;
        let url = endpoint.url_for(options.call_kind.endpoint());

        info!(
            "Sending chat completion for model {} [request_id: {}]",
            request.model, request_id
        );
        debug!("Request URL: {}", url);

        let body = serde_json::to_vec(request).map_err(|e| UnexpectedError::Serialization {
            message: format!("{} [request_id: {}]", e, request_id),
        })?;

        let mut req_builder = self
            .client
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", endpoint.api_key.expose_secret()),
            )
            .header(CONTENT_TYPE, "application/json")
            .header("X-Request-ID", request_id.to_string())
            .body(body);

        if let Some(timeout) = options.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, &options))?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = self.read_error_body(response, request_id).await;

            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );

            return Err(
                crate::http::error::map_http_error(status, Some(&headers), body, request_id).into(),
            );
        }

        Self::validate_content_type(&response, &options)?;
        self.check_content_length(&response, &options)?;

        let response_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                UnexpectedError::Timeout { request_id }
            } else {
                UnexpectedError::Network {
                    message: format!(
                        "Failed to read response body: {} [request_id: {}]",
                        e, request_id
                    ),
                }
            }
        })?;

        // Chunked bodies carry no content-length
        if response_text.len() > self.max_response_size {
            return Err(UnexpectedError::ResponseTooLarge {
                size: response_text.len(),
                max: self.max_response_size,
                request_id,
            }
            .into());
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(
                "Failed to parse response [request_id: {}]: {}",
                request_id, e
            );
            UnexpectedError::Decode {
                message: format!("{} [request_id: {}]", e, request_id),
            }
        })?;

        info!(
            "Request completed with {} choice(s) [request_id: {}]",
            parsed.choices.len(),
            request_id
        );

        Ok(parsed)
    }
}
