mod client;
pub(crate) mod types;
pub mod util;

use anyhow::{anyhow, Result};

use client::ClaudeClient;
use types::{ChatRequest, WireMessage};

/// Anthropic chat model handle. Cheap to clone; each call builds a fresh
/// request through a shared HTTP client.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    /// Point at a proxy or mock server instead of api.anthropic.com.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key);
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    /// Send a system + user prompt pair, return the first text block.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .max_tokens(4096)
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No text content in Claude response"))
    }

    /// Single-prompt completion. The pipeline's extraction contract only
    /// needs "prompt in, text out"; richer conversation shapes stay out of
    /// this crate.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat_completion("You are a precise data extraction assistant.", prompt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_model() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514");
        assert_eq!(ai.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn base_url_override() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514")
            .with_base_url("http://localhost:9999");
        assert_eq!(ai.base_url.as_deref(), Some("http://localhost:9999"));
    }
}
