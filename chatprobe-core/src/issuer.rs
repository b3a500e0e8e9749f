//! The request issuer: one conversation, one round trip, one reply

use crate::config::{EndpointConfig, ProbeConfig, RequestConfig, SafeLogging};
use crate::error::{CompletionResult, UnexpectedError};
use crate::http::client::HttpClient;
use crate::http::{CallKind, HttpExecutor, RequestOptions};
use crate::protocol::types::{ChatRequest, ChatResponse, CompletionUsage, Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Text of the first choice plus what the service said about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Assistant text; `None` when the service returned null content
    pub content: Option<String>,

    /// Model that served the request, as reported by the service
    pub model: Option<String>,

    pub finish_reason: Option<String>,

    pub usage: Option<CompletionUsage>,

    /// Correlation ID sent with the request
    pub request_id: Uuid,
}

impl Reply {
    /// Take the first choice of a response
    ///
    /// An empty choice list is an unexpected error; null content is not.
    pub fn from_response(response: ChatResponse, request_id: Uuid) -> CompletionResult<Self> {
        let ChatResponse {
            model,
            choices,
            usage,
            ..
        } = response;

        let choice = choices
            .into_iter()
            .next()
            .ok_or(UnexpectedError::EmptyChoices { request_id })?;

        Ok(Self {
            content: choice.message.content,
            model,
            finish_reason: choice.finish_reason,
            usage,
            request_id,
        })
    }
}

/// Issues the probe conversation against one endpoint
pub struct RequestIssuer<E = HttpClient> {
    executor: E,
    endpoint: EndpointConfig,
    request: RequestConfig,
}

impl RequestIssuer<HttpClient> {
    /// Issuer over the reqwest client, built from the connection settings
    pub fn from_config(config: &ProbeConfig) -> CompletionResult<Self> {
        let client = HttpClient::from_config(&config.connection)?;
        Ok(Self::with_executor(client, config))
    }
}

impl<E: HttpExecutor> RequestIssuer<E> {
    pub fn with_executor(executor: E, config: &ProbeConfig) -> Self {
        debug!("Request issuer configured: {}", config.safe_for_logging());
        Self {
            executor,
            endpoint: config.endpoint.clone(),
            request: config.request.clone(),
        }
    }

    /// The fixed conversation: system prompt, then user prompt
    pub fn build_request(&self) -> ChatRequest {
        let mut request = ChatRequest::new(
            self.request.model.clone(),
            vec![
                Message::system(self.request.system_prompt.clone()),
                Message::user(self.request.user_prompt.clone()),
            ],
        );

        if let Some(temperature) = self.request.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.request.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }

    /// Send the conversation once and extract the first reply
    pub async fn issue(&self) -> CompletionResult<Reply> {
        let request = self.build_request();
        let options = RequestOptions::new(CallKind::Chat);
        let request_id = options.request_id;

        let response = self
            .executor
            .execute_json(&self.endpoint, &request, options)
            .await?;

        let reply = Reply::from_response(response, request_id)?;

        if reply.content.is_none() {
            warn!(
                "First choice has no content (finish_reason: {:?}) [request_id: {}]",
                reply.finish_reason, request_id
            );
        }
        if let Some(usage) = &reply.usage {
            info!(
                "Token usage: prompt={} completion={} total={} [request_id: {}]",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, request_id
            );
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::error::{ApiError, ApiErrorKind, CompletionError, ErrorClass};
    use crate::protocol::types::{MessageRole, ResponseChoice, ResponseMessage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Executor that replays a canned outcome and records what it was given
    struct ScriptedExecutor {
        outcome: fn(Uuid) -> CompletionResult<ChatResponse>,
        calls: AtomicUsize,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedExecutor {
        fn new(outcome: fn(Uuid) -> CompletionResult<ChatResponse>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpExecutor for ScriptedExecutor {
        async fn execute_json(
            &self,
            _endpoint: &EndpointConfig,
            request: &ChatRequest,
            options: RequestOptions,
        ) -> CompletionResult<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            (self.outcome)(options.request_id)
        }
    }

    fn config() -> ProbeConfig {
        let mut config = ProbeConfig::default();
        config.endpoint.api_key = SecretString::new("sk-unit-test-key");
        config
    }

    fn reply_with(content: Option<&str>) -> ChatResponse {
        ChatResponse {
            choices: vec![ResponseChoice {
                index: 0,
                message: ResponseMessage {
                    role: Some(MessageRole::Assistant),
                    content: content.map(str::to_string),
                    refusal: None,
                },
                finish_reason: Some("stop".to_string()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_request_is_the_fixed_conversation() {
        let issuer = RequestIssuer::with_executor(ScriptedExecutor::new(|_| Ok(reply_with(None))), &config());
        let request = issuer.build_request();

        assert_eq!(request.model, "cline/o3-mini:high");
        assert_eq!(
            request.messages,
            vec![
                Message::system("You are a helpful assistant."),
                Message::user("Hello! How can you help me today?"),
            ]
        );
        assert_eq!(request.temperature, None);
        assert_eq!(request.max_tokens, None);
    }

    #[tokio::test]
    async fn test_issue_returns_first_choice_once() {
        let executor = ScriptedExecutor::new(|_| Ok(reply_with(Some("Hi there"))));
        let issuer = RequestIssuer::with_executor(executor, &config());

        let reply = issuer.issue().await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("Hi there"));
        assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
        assert_eq!(issuer.executor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(issuer.executor.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_null_content_is_not_an_error() {
        let issuer =
            RequestIssuer::with_executor(ScriptedExecutor::new(|_| Ok(reply_with(None))), &config());
        let reply = issuer.issue().await.unwrap();
        assert_eq!(reply.content, None);
    }

    #[tokio::test]
    async fn test_empty_choices_is_unexpected() {
        let issuer = RequestIssuer::with_executor(
            ScriptedExecutor::new(|_| Ok(ChatResponse::default())),
            &config(),
        );

        let err = issuer.issue().await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Unexpected);
        assert!(matches!(
            err,
            CompletionError::Unexpected(UnexpectedError::EmptyChoices { .. })
        ));
    }

    #[tokio::test]
    async fn test_api_errors_pass_through_without_retry() {
        let executor = ScriptedExecutor::new(|request_id| {
            Err(ApiError {
                status: 429,
                kind: ApiErrorKind::RateLimit,
                message: "Too many requests".to_string(),
                error_type: None,
                code: None,
                param: None,
                retry_after: None,
                request_id,
            }
            .into())
        });
        let issuer = RequestIssuer::with_executor(executor, &config());

        let err = issuer.issue().await.unwrap_err();
        assert_eq!(err.as_api_error().map(|e| e.status), Some(429));
        assert_eq!(issuer.executor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sampling_fields_flow_into_request() {
        let mut config = config();
        config.request.temperature = Some(0.3);
        config.request.max_tokens = Some(256);

        let issuer = RequestIssuer::with_executor(ScriptedExecutor::new(|_| Ok(reply_with(None))), &config);
        let request = issuer.build_request();
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(256));
    }
}
