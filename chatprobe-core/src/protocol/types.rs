//! Core protocol types for chat-completion calls

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    /// Model identifier to use
    pub model: String,

    /// Messages in conversation order
    pub messages: Vec<Message>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Complete chat response
///
/// Every field except `choices` is informational, and all of them default
/// when the service leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatResponse {
    /// Unique response ID
    #[serde(default)]
    pub id: Option<String>,

    /// Object type (usually "chat.completion")
    #[serde(default)]
    pub object: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<i64>,

    /// Model that actually served the request
    #[serde(default)]
    pub model: Option<String>,

    /// Response choices
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,

    /// Token usage information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

/// Response choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseChoice {
    /// Choice index
    #[serde(default)]
    pub index: usize,

    /// Generated message
    pub message: ResponseMessage,

    /// Finish reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Message inside a response choice; `content` may be null
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    #[serde(default)]
    pub content: Option<String>,

    /// Refusal text, when the model declined to answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl ChatRequest {
    /// Create a new chat request with model and messages
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl ChatResponse {
    /// The first choice, which is the only one the probe looks at
    pub fn first_choice(&self) -> Option<&ResponseChoice> {
        self.choices.first()
    }
}
