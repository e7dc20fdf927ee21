//! Completion engine abstraction.
//!
//! The review driver talks to a [`CompletionProvider`] trait object so the
//! transport can be swapped out in tests. The production implementation
//! speaks the OpenAI-compatible HTTP API that vLLM and similar local
//! engines expose.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiCompatProvider;

/// Errors from the completion engine.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine returned no models")]
    NoModels,

    #[error("engine returned an empty completion")]
    EmptyCompletion,
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Ask the engine which model it is serving. Used both as a
    /// connectivity probe and to name the model in requests.
    async fn detect_model(&self) -> Result<String, ProviderError>;

    /// Run one system+user completion and return the assistant text.
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, ProviderError>;
}
