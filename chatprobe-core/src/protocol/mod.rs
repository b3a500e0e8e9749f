//! Protocol module for chat-completion request/response structures
//!
//! These are the wire shapes exchanged with an OpenAI-compatible
//! `/chat/completions` endpoint. Requests serialize only the fields that are
//! set; responses deserialize leniently so that minimal bodies still parse.

pub mod types;

pub use types::{
    ChatRequest, ChatResponse, CompletionUsage, Message, MessageRole, ResponseChoice,
    ResponseMessage,
};
