//! Text extraction for uploaded documents.
//!
//! Dispatches on the declared MIME type to one of five format handlers
//! (plain text, PDF, DOCX, CSV, HTML). Unknown types yield `Ok(None)`.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use scraper::Html;
use std::io::{Cursor, Read};
use tracing::debug;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Elements whose text is never rendered by a browser.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of visible text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// A file received from the upload form. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
    Csv,
    Html,
}

impl DocumentKind {
    /// Map a MIME type (parameters and case ignored) to a document kind.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" => Some(Self::PlainText),
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            "text/csv" => Some(Self::Csv),
            "text/html" => Some(Self::Html),
            _ => None,
        }
    }

    /// Resolve the kind of an upload.
    ///
    /// The declared type wins; the file extension is only consulted when the
    /// client sent no type or the generic `application/octet-stream`.
    pub fn detect(file: &UploadedFile) -> Option<Self> {
        match file.content_type.as_deref() {
            Some(mime) if !is_generic_mime(mime) => Self::from_mime(mime),
            _ => mime_guess::from_path(&file.filename)
                .first_raw()
                .and_then(Self::from_mime),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }
}

fn is_generic_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence.is_empty() || essence.eq_ignore_ascii_case("application/octet-stream")
}

/// Extract text from an upload.
///
/// Returns `Ok(None)` for unsupported formats and for documents that contain
/// no text at all. Malformed input is an error.
pub fn extract_text(file: &UploadedFile) -> Result<Option<String>> {
    let Some(kind) = DocumentKind::detect(file) else {
        debug!(
            "No extractor for {} (declared type: {:?})",
            file.filename, file.content_type
        );
        return Ok(None);
    };

    debug!("Extracting {} as {}", file.filename, kind.label());

    let text = match kind {
        DocumentKind::PlainText | DocumentKind::Csv => decode_utf8(&file.data)?,
        DocumentKind::Pdf => extract_pdf_text(&file.data)?,
        DocumentKind::Docx => extract_docx_text(&file.data)?,
        DocumentKind::Html => extract_html_text(&decode_utf8(&file.data)?),
    };

    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(text))
}

fn decode_utf8(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec()).context("File is not valid UTF-8")
}

/// Extract text from a PDF file using lopdf, one page at a time.
fn extract_pdf_text(data: &[u8]) -> Result<String> {
    use lopdf::Document;

    let doc = Document::load_from(Cursor::new(data))
        .map_err(|e| anyhow::anyhow!("Failed to load PDF: {}", e))?;

    let pages: Vec<String> = doc
        .get_pages()
        .into_keys()
        .map(|page_num| match doc.extract_text(&[page_num]) {
            Ok(content) => content.trim_end().to_string(),
            Err(e) => {
                debug!("Page {} yielded no text: {}", page_num, e);
                String::new()
            }
        })
        .collect();

    Ok(pages.join("\n"))
}

/// Extract body text from a WordprocessingML (.docx) package.
fn extract_docx_text(data: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("Failed to open DOCX container")?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    // Paragraph properties hold tab-stop definitions, which are not content.
    let mut in_paragraph_props = false;

    loop {
        match reader.read_event().context("Malformed word/document.xml")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = true,
                b"w:pPr" => in_paragraph_props = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:pPr" => in_paragraph_props = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" if !in_paragraph_props => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                text.push_str(&t.unescape().context("Bad text in word/document.xml")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// Strip markup and return the visible text of an HTML document.
fn extract_html_text(source: &str) -> String {
    let document = Html::parse_document(source);
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                raw.push('\n');
            }
            continue;
        }

        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });

        if !hidden {
            raw.push_str(text);
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
