//! Chatprobe Core Library
//!
//! Sends one chat-completion request to an OpenAI-compatible routing
//! endpoint and classifies the outcome for the console.

pub mod config;
pub mod console;
pub mod error;
pub mod http;
pub mod issuer;
pub mod protocol;

pub use config::ProbeConfig;
pub use error::{ApiError, CompletionError, CompletionResult, ErrorClass, UnexpectedError};
pub use issuer::{Reply, RequestIssuer};

/// Run one probe with the given configuration
pub async fn run(config: &ProbeConfig) -> CompletionResult<Reply> {
    RequestIssuer::from_config(config)?.issue().await
}

/// Returns the version of the Chatprobe Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
