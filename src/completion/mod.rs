//! Text-completion providers.
//!
//! Both backends receive the same `"<intent>: <text>"` prompt and the same
//! output budget; they differ only in wire format.

pub mod anthropic;
pub mod openai;

/// Output budget requested from every provider.
pub const MAX_TOKENS: u32 = 200;

/// Async trait implemented by each completion backend.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Build the prompt sent to every provider.
pub fn build_prompt(intent: &str, text: &str) -> String {
    format!("{}: {}", intent, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        assert_eq!(build_prompt("summarize", "hello world"), "summarize: hello world");
    }

    #[test]
    fn test_build_prompt_keeps_intent_verbatim() {
        assert_eq!(build_prompt("", "text"), ": text");
        assert_eq!(
            build_prompt("  list key points ", "a\nb"),
            "  list key points : a\nb"
        );
    }
}
