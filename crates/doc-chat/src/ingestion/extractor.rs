//! Text extractors, one per document kind

use calamine::Reader;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, OnceLock};
use std::thread;
use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};
use crate::types::DocumentKind;

/// Turns the raw bytes of one document kind into plain text
pub trait Extractor: Send + Sync {
    /// Extract plain text. Implementations are blocking.
    fn extract(&self, bytes: &[u8]) -> Result<String>;

    /// Get extractor name for logging
    fn name(&self) -> &str;
}

/// Maps document kinds to their extractor
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Registry without any extractor
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register (or replace) the extractor for a kind
    pub fn register(&mut self, kind: DocumentKind, extractor: Arc<dyn Extractor>) -> &mut Self {
        self.extractors.insert(kind, extractor);
        self
    }

    /// Look up the extractor for a kind
    pub fn get(&self, kind: DocumentKind) -> Result<Arc<dyn Extractor>> {
        self.extractors
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::UnsupportedKind(format!("no extractor for {}", kind)))
    }

    /// Kinds with a registered extractor
    pub fn kinds(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.extractors.contains_key(kind))
            .collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "pdf")]
        registry.register(DocumentKind::Pdf, Arc::new(PdfExtractor));
        #[cfg(feature = "docx")]
        registry.register(DocumentKind::Docx, Arc::new(DocxExtractor));
        #[cfg(feature = "xlsx")]
        registry.register(DocumentKind::Spreadsheet, Arc::new(SpreadsheetExtractor));
        registry.register(DocumentKind::WebPage, Arc::new(HtmlExtractor));
        registry
    }
}

fn spaces() -> &'static Regex {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    SPACES.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").expect("valid regex"))
}

/// Collapse runs of spaces, trim every line and drop blank lines
fn normalize_whitespace(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(|line| spaces().replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace typographic ligatures and glyphs that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    const REPLACEMENTS: &[(char, &str)] = &[
        ('\u{FB00}', "ff"),
        ('\u{FB01}', "fi"),
        ('\u{FB02}', "fl"),
        ('\u{FB03}', "ffi"),
        ('\u{FB04}', "ffl"),
        ('\u{2010}', "-"),
        ('\u{2011}', "-"),
        ('\u{2013}', "-"),
        ('\u{2014}', "--"),
        ('\u{2018}', "'"),
        ('\u{2019}', "'"),
        ('\u{201C}', "\""),
        ('\u{201D}', "\""),
        ('\u{2022}', "* "),
        ('\u{2026}', "..."),
    ];

    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }
    result
}

fn ensure_text(kind: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::extraction(
            kind,
            "no text content could be extracted",
        ));
    }
    Ok(text)
}

/// PDF extraction with `pdf-extract`, falling back to per-page `lopdf` text
pub struct PdfExtractor;

impl PdfExtractor {
    /// Longest time pdf-extract may spend on one document
    const PRIMARY_TIMEOUT: Duration = Duration::from_secs(60);

    /// Run pdf-extract on its own thread.
    ///
    /// pdf-extract panics on some malformed font tables and can spin on
    /// others. A panic or a timeout yields `None`.
    fn extract_primary(bytes: &[u8]) -> Option<String> {
        let data = bytes.to_vec();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("pdf-extract".to_string())
            .spawn(move || {
                let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
            });
        if let Err(e) = spawned {
            tracing::warn!("could not start pdf-extract thread: {}, trying lopdf", e);
            return None;
        }

        match rx.recv_timeout(Self::PRIMARY_TIMEOUT) {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::debug!("pdf-extract produced no text, trying lopdf");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf", e);
                None
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "pdf-extract timed out after {:?}, trying lopdf",
                    Self::PRIMARY_TIMEOUT
                );
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!("pdf-extract panicked, trying lopdf");
                None
            }
        }
    }

    fn extract_fallback(bytes: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| Error::extraction("pdf", format!("failed to load PDF: {}", e)))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => tracing::debug!("Could not extract page {}: {}", page_number, e),
            }
        }

        if text.trim().is_empty() {
            return Err(Error::extraction(
                "pdf",
                "PDF appears to be image-based or has no extractable text",
            ));
        }
        Ok(text)
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let raw = match Self::extract_primary(bytes) {
            Some(text) => text,
            None => Self::extract_fallback(bytes)?,
        };
        ensure_text("pdf", normalize_whitespace(&cleanup_pdf_text(&raw)))
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// DOCX text via `docx-rs`: paragraphs in order, table rows as ` | `-joined cells
pub struct DocxExtractor;

impl DocxExtractor {
    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut text = String::new();
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for child in &run.children {
                    if let docx_rs::RunChild::Text(t) = child {
                        text.push_str(&t.text);
                    }
                }
            }
        }
        text
    }

    fn push_table(table: &docx_rs::Table, content: &mut String) {
        for docx_rs::TableChild::TableRow(row) in &table.rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for docx_rs::TableRowChild::TableCell(cell) in &row.cells {
                let mut parts = Vec::new();
                for child in &cell.children {
                    match child {
                        docx_rs::TableCellContent::Paragraph(p) => parts.push(Self::paragraph_text(p)),
                        docx_rs::TableCellContent::Table(nested) => {
                            let mut inner = String::new();
                            Self::push_table(nested, &mut inner);
                            parts.push(inner.lines().collect::<Vec<_>>().join(" "));
                        }
                        _ => {}
                    }
                }
                cells.push(parts.join(" ").trim().to_string());
            }
            if cells.iter().any(|c| !c.is_empty()) {
                content.push_str(&cells.join(" | "));
                content.push('\n');
            }
        }
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(bytes).map_err(|e| Error::extraction("docx", e.to_string()))?;

        let mut content = String::new();
        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    content.push_str(&Self::paragraph_text(p));
                    content.push('\n');
                }
                docx_rs::DocumentChild::Table(table) => Self::push_table(table, &mut content),
                _ => {}
            }
        }

        ensure_text("docx", normalize_whitespace(&content))
    }

    fn name(&self) -> &str {
        "docx"
    }
}

/// Spreadsheets as rows of ` | `-joined cells, one block per sheet
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    fn is_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(b"PK\x03\x04")
    }

    fn is_ole(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0])
    }

    fn extract_workbook(bytes: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(bytes);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::extraction("spreadsheet", e.to_string()))?;

        let mut content = String::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!("Skipping sheet '{}': {}", sheet_name, e);
                    continue;
                }
            };

            content.push_str(&format!("Sheet: {}\n", sheet_name));
            for row in range.rows() {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        calamine::Data::Empty => String::new(),
                        calamine::Data::String(s) => s.clone(),
                        calamine::Data::Float(f) => f.to_string(),
                        calamine::Data::Int(i) => i.to_string(),
                        calamine::Data::Bool(b) => b.to_string(),
                        calamine::Data::DateTime(dt) => dt.to_string(),
                        calamine::Data::DateTimeIso(s) => s.clone(),
                        _ => String::new(),
                    })
                    .collect();

                if cells.iter().any(|c| !c.is_empty()) {
                    content.push_str(&cells.join(" | "));
                    content.push('\n');
                }
            }
            content.push('\n');
        }

        Ok(content)
    }

    fn extract_csv(bytes: &[u8]) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut content = String::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::extraction("csv", e.to_string()))?;
            if record.iter().any(|field| !field.trim().is_empty()) {
                content.push_str(&record.iter().map(str::trim).collect::<Vec<_>>().join(" | "));
                content.push('\n');
            }
        }
        Ok(content)
    }
}

impl Extractor for SpreadsheetExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let content = if Self::is_zip(bytes) || Self::is_ole(bytes) {
            Self::extract_workbook(bytes)?
        } else {
            Self::extract_csv(bytes)?
        };
        ensure_text("spreadsheet", normalize_whitespace(&content))
    }

    fn name(&self) -> &str {
        "spreadsheet"
    }
}

/// HTML to text via `scraper`: title plus visible body text
pub struct HtmlExtractor;

impl HtmlExtractor {
    const SKIPPED: [&'static str; 5] = ["script", "style", "noscript", "template", "svg"];

    /// Elements that start a new line of text
    const BLOCKS: &'static [&'static str] = &[
        "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "div", "dl",
        "dt", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
        "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th",
        "tr", "ul",
    ];

    /// Append the visible text under `element`; inline markup stays on one line
    fn push_text(element: scraper::ElementRef<'_>, content: &mut String) {
        let name = element.value().name();
        if Self::SKIPPED.contains(&name) {
            return;
        }
        let block = Self::BLOCKS.contains(&name);
        if block {
            content.push('\n');
        }
        for child in element.children() {
            if let Some(child) = scraper::ElementRef::wrap(child) {
                Self::push_text(child, content);
            } else if let Some(text) = child.value().as_text() {
                // source line breaks inside a block are just spacing
                content.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
            }
        }
        if block {
            content.push('\n');
        }
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let html = String::from_utf8_lossy(bytes);
        let document = scraper::Html::parse_document(&html);

        let mut content = String::new();

        let title_selector = scraper::Selector::parse("title")
            .map_err(|e| Error::internal(format!("invalid selector: {:?}", e)))?;
        if let Some(title) = document.select(&title_selector).next() {
            let title = title.text().collect::<String>();
            if !title.trim().is_empty() {
                content.push_str(title.trim());
                content.push('\n');
            }
        }

        let body_selector = scraper::Selector::parse("body")
            .map_err(|e| Error::internal(format!("invalid selector: {:?}", e)))?;
        let root = document
            .select(&body_selector)
            .next()
            .unwrap_or_else(|| document.root_element());
        Self::push_text(root, &mut content);

        ensure_text("web page", normalize_whitespace(&content))
    }

    fn name(&self) -> &str {
        "html"
    }
}
