//! Text-completion backends
//!
//! The analysis pipeline talks to a model through [`CompletionProvider`]:
//! - [`OpenAiProvider`]: OpenAI-compatible `chat/completions` endpoint
//! - [`MockProvider`]: deterministic scripted responses for tests and dry runs

mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Errors a completion call can fail with
///
/// The analysis coordinator treats every variant the same way.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    pub temperature: f32,
}

/// A model that turns a prompt into text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
