//! Anthropic legacy `/v1/complete` client, called over raw HTTP.

use super::{CompletionProvider, MAX_TOKENS};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

#[async_trait::async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Sending completion request to Anthropic: prompt_chars={}", prompt.len());

        let response = self
            .client
            .post(format!("{}/v1/complete", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&CompleteRequest {
                prompt,
                max_tokens: MAX_TOKENS,
            })
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        // A response without `completion` is an empty result, not a failure.
        let text = body
            .get("completion")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!("Anthropic completion: {} chars", text.len());
        Ok(text)
    }
}
