//! One upload in, one analysis out.
//!
//! Steps run strictly in order: extraction, provider A, provider B, report.
//! Any failure aborts the request; no partial analysis is returned.

use crate::completion::anthropic::AnthropicClient;
use crate::completion::openai::OpenAiClient;
use crate::completion::{build_prompt, CompletionProvider};
use crate::config::AppConfig;
use crate::extractor::{self, UploadedFile};
use crate::report::{Report, TextStats};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

/// Message shown for every extraction problem.
pub const UNSUPPORTED_MESSAGE: &str = "Unsupported file type or error extracting text.";

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("{}", UNSUPPORTED_MESSAGE)]
    Unsupported,
    #[error("{}", UNSUPPORTED_MESSAGE)]
    Extraction(#[source] anyhow::Error),
    #[error("{provider} analysis failed: {source:#}")]
    Provider {
        provider: String,
        source: anyhow::Error,
    },
}

/// Credentials typed into the form. Only ever held for one request.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openai: String,
    pub claude: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &"<redacted>")
            .field("claude", &"<redacted>")
            .finish()
    }
}

/// Outcome of a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub id: String,
    pub source_file: String,
    pub content_hash: String,
    pub intent: String,
    pub extracted_text: String,
    pub openai_result: String,
    pub claude_result: String,
    pub stats: TextStats,
    pub report: String,
}

/// Runs the extraction and completion pipeline.
pub struct Analyzer {
    openai: Box<dyn CompletionProvider>,
    claude: Box<dyn CompletionProvider>,
}

impl Analyzer {
    pub fn new(openai: Box<dyn CompletionProvider>, claude: Box<dyn CompletionProvider>) -> Self {
        Self { openai, claude }
    }

    /// Wire up both provider clients with the keys from the current request.
    pub fn for_request(config: &AppConfig, http: &reqwest::Client, keys: &ApiKeys) -> Self {
        Self::new(
            Box::new(OpenAiClient::new(
                http.clone(),
                config.openai_base_url.clone(),
                keys.openai.clone(),
            )),
            Box::new(AnthropicClient::new(
                http.clone(),
                config.anthropic_base_url.clone(),
                keys.claude.clone(),
            )),
        )
    }

    pub async fn run(&self, file: &UploadedFile, intent: &str) -> Result<Analysis, AnalyzeError> {
        let id = Uuid::new_v4().to_string();
        let content_hash = {
            let mut hasher = Sha256::new();
            hasher.update(&file.data);
            format!("{:x}", hasher.finalize())
        };

        info!(
            "[{}] Analyzing {} ({} bytes, declared type {:?})",
            id,
            file.filename,
            file.data.len(),
            file.content_type
        );

        let text = match extractor::extract_text(file) {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("[{}] Unsupported or empty document: {}", id, file.filename);
                return Err(AnalyzeError::Unsupported);
            }
            Err(e) => {
                warn!("[{}] Extraction failed for {}: {:#}", id, file.filename, e);
                return Err(AnalyzeError::Extraction(e));
            }
        };

        info!("[{}] Extracted {} chars", id, text.chars().count());

        let prompt = build_prompt(intent, &text);
        let openai_result = complete_with(self.openai.as_ref(), &prompt).await?;
        let claude_result = complete_with(self.claude.as_ref(), &prompt).await?;

        let report = Report::new(openai_result.clone(), claude_result.clone(), &text);
        let rendered = report.render();

        info!(
            "[{}] Analysis complete: {} words, {} chars",
            id, report.stats.word_count, report.stats.char_count
        );

        Ok(Analysis {
            id,
            source_file: file.filename.clone(),
            content_hash,
            intent: intent.to_string(),
            extracted_text: text,
            openai_result,
            claude_result,
            stats: report.stats,
            report: rendered,
        })
    }
}

async fn complete_with(
    provider: &dyn CompletionProvider,
    prompt: &str,
) -> Result<String, AnalyzeError> {
    provider
        .complete(prompt)
        .await
        .map_err(|source| AnalyzeError::Provider {
            provider: provider.name().to_string(),
            source,
        })
}
