//! Text statistics and the downloadable analysis report.

use serde::Serialize;

/// File name offered for the report download.
pub const REPORT_FILE_NAME: &str = "analysis_report.txt";
/// MIME type of the report download.
pub const REPORT_MIME: &str = "text/plain";

/// Word and character counts of the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
}

impl TextStats {
    /// Words are whitespace-separated tokens; characters are Unicode scalar values.
    pub fn of(text: &str) -> Self {
        Self {
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
        }
    }
}

/// Plain-text report combining both completions with the text statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub openai: String,
    pub claude: String,
    pub stats: TextStats,
}

impl Report {
    pub fn new(openai: impl Into<String>, claude: impl Into<String>, text: &str) -> Self {
        Self {
            openai: openai.into(),
            claude: claude.into(),
            stats: TextStats::of(text),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "OpenAI Analysis:\n{}\n\nClaude AI Analysis:\n{}\n\nWord Count: {}\nCharacter Count: {}",
            self.openai, self.claude, self.stats.word_count, self.stats.char_count
        )
    }
}
