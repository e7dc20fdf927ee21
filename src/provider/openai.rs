//! OpenAI-compatible HTTP client for local completion engines.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::constants::ENV_API_KEY;
use crate::env::Env;

use super::{CompletionProvider, ProviderError};

/// Client for any engine speaking the OpenAI chat-completions API,
/// typically a local vLLM instance that needs no real API key.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiCompatProvider {
    /// `base_url` is the API root including `/v1`; `api_key` may be a
    /// placeholder for engines that do not check it.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build a provider with the API key resolved from `env`
    /// (`CRITIQUE_API_KEY`). Local engines usually ignore the key, so an
    /// unset variable falls back to a placeholder instead of failing.
    pub fn from_env(base_url: &str, env: &Env) -> Self {
        let api_key = env
            .var(ENV_API_KEY)
            .unwrap_or_else(|_| "not-needed".to_string());
        Self::new(base_url, &api_key)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    async fn detect_model(&self) -> Result<String, ProviderError> {
        let list: ModelList = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        list.data
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or(ProviderError::NoModels)
    }

    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_resolves_from_environment() {
        let env = Env::mock([(ENV_API_KEY, "sk-local")]);
        let provider = OpenAiCompatProvider::from_env("http://localhost:8000/v1", &env);
        assert_eq!(provider.api_key, "sk-local");
    }

    #[test]
    fn missing_api_key_falls_back_to_placeholder() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        let provider = OpenAiCompatProvider::from_env("http://localhost:8000/v1", &env);
        assert_eq!(provider.api_key, "not-needed");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let provider = OpenAiCompatProvider::new("http://localhost:8000/v1/", "not-needed");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[tokio::test]
    async fn unreachable_engine_is_an_error() {
        // Port 1 is never serving an API.
        let provider = OpenAiCompatProvider::new("http://127.0.0.1:1/v1", "not-needed");
        assert!(provider.detect_model().await.is_err());
    }
}
