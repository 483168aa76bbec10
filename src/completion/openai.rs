//! OpenAI legacy completions client (engine-addressed endpoint).

use super::{CompletionProvider, MAX_TOKENS};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_ENGINE: &str = "text-davinci-003";

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    engine: String,
}

impl OpenAiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/engines/{}/completions", self.base_url, self.engine)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(
            "Sending completion request to OpenAI: engine={}, prompt_chars={}",
            self.engine,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                prompt,
                max_tokens: MAX_TOKENS,
            })
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let response: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .context("OpenAI response contained no choices")?;

        info!("OpenAI completion: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_returns_trimmed_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/engines/text-davinci-003/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(serde_json::json!({
                "prompt": "summarize: hello world",
                "max_tokens": 200
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"text": "\n\nA greeting.  "}, {"text": "ignored"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Client::new(), server.uri(), "sk-test");
        let text = client.complete("summarize: hello world").await.unwrap();
        assert_eq!(text, "A greeting.");
    }

    #[tokio::test]
    async fn test_auth_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Client::new(), server.uri(), "bad");
        let err = client.complete("x: y").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_no_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Client::new(), server.uri(), "sk-test");
        assert!(client.complete("x: y").await.is_err());
    }
}
