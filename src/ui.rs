//! Server-rendered HTML pages for the browser UI.
//!
//! Pages are askama templates under `templates/`; user content is escaped by
//! the template engine.

use crate::analysis::Analysis;
use crate::report::{TextStats, REPORT_FILE_NAME};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

const CHART_WIDTH: usize = 320;
const CHART_HEIGHT: usize = 200;
const BAR_WIDTH: usize = 80;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage;

/// Error page; the form is repeated so the user can try again.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub message: &'a str,
}

#[derive(Template)]
#[template(path = "analysis.html")]
pub struct AnalysisPage<'a> {
    pub analysis: &'a Analysis,
    pub chart: BarChart,
}

impl<'a> AnalysisPage<'a> {
    pub fn new(analysis: &'a Analysis) -> Self {
        Self {
            analysis,
            chart: BarChart::of(&analysis.stats),
        }
    }
}

/// Geometry of the two-bar word/character chart.
#[derive(Debug)]
pub struct BarChart {
    pub width: usize,
    pub height: usize,
    pub bars: Vec<Bar>,
}

#[derive(Debug)]
pub struct Bar {
    pub label: &'static str,
    pub value: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub label_x: usize,
}

impl BarChart {
    /// Bars are scaled so the larger count fills the chart height.
    pub fn of(stats: &TextStats) -> Self {
        let max = stats.word_count.max(stats.char_count).max(1);
        let bars = [("Words", stats.word_count, 60), ("Characters", stats.char_count, 180)]
            .into_iter()
            .map(|(label, value, x)| {
                let height = value * CHART_HEIGHT / max;
                Bar {
                    label,
                    value,
                    x,
                    y: CHART_HEIGHT - height,
                    width: BAR_WIDTH,
                    height,
                    label_x: x + BAR_WIDTH / 2,
                }
            })
            .collect();

        Self {
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            bars,
        }
    }
}

/// Render a page into an HTML response.
pub fn render<T: Template>(page: &T) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// `Content-Disposition` value for the report download.
pub fn report_disposition() -> String {
    format!("attachment; filename=\"{}\"", REPORT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> Analysis {
        Analysis {
            id: "id".to_string(),
            source_file: "notes<1>.txt".to_string(),
            content_hash: "0".repeat(64),
            intent: "summarize".to_string(),
            extracted_text: "hello <world>".to_string(),
            openai_result: "Fish & chips".to_string(),
            claude_result: "\"quoted\"".to_string(),
            stats: TextStats::of("hello <world>"),
            report: "line one\nline two".to_string(),
        }
    }

    #[test]
    fn test_index_has_masked_key_fields() {
        let html = IndexPage.render().unwrap();
        assert!(html.contains(r#"type="password" id="openai_api_key""#));
        assert!(html.contains(r#"type="password" id="claude_api_key""#));
        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(html.contains(".txt,.pdf,.docx,.csv,.html"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let html = ErrorPage {
            message: "<b>bad</b> & worse",
        }
        .render()
        .unwrap();
        assert!(html.contains("&lt;b&gt;bad"));
        assert!(html.contains("&amp; worse"));
        assert!(!html.contains("<b>bad"));
        assert!(html.contains(r#"name="intent""#));
    }

    #[test]
    fn test_analysis_page_escapes_user_content() {
        let analysis = analysis();
        let html = AnalysisPage::new(&analysis).render().unwrap();
        assert!(html.contains("notes&lt;1&gt;.txt"));
        assert!(html.contains("hello &lt;world&gt;"));
        assert!(html.contains("Fish &amp; chips"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(!html.contains("<world>"));
        assert!(html.contains("Word Count: 2"));
        assert!(html.contains("Character Count: 13"));
        assert!(html.contains("action=\"/report\""));
        assert_eq!(html.matches("<rect").count(), 2);
    }

    #[test]
    fn test_bar_chart_scales_to_largest_count() {
        let chart = BarChart::of(&TextStats {
            word_count: 2,
            char_count: 11,
        });
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].height, 36);
        assert_eq!(chart.bars[0].y, 164);
        assert_eq!(chart.bars[1].height, 200);
        assert_eq!(chart.bars[1].y, 0);
    }

    #[test]
    fn test_bar_chart_handles_zero_counts() {
        let chart = BarChart::of(&TextStats {
            word_count: 0,
            char_count: 0,
        });
        assert!(chart.bars.iter().all(|bar| bar.height == 0));
    }

    #[test]
    fn test_report_disposition() {
        assert_eq!(
            report_disposition(),
            "attachment; filename=\"analysis_report.txt\""
        );
    }
}
