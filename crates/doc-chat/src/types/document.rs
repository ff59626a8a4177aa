//! Document and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kinds of content that can be initialized as a chat session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Spreadsheet (.xlsx, .xls, .ods, .csv)
    Spreadsheet,
    /// HTML page, fetched from a URL or uploaded
    WebPage,
}

impl DocumentKind {
    /// All kinds, in display order
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Pdf,
        DocumentKind::Docx,
        DocumentKind::Spreadsheet,
        DocumentKind::WebPage,
    ];

    /// Detect kind from a MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.oasis.opendocument.spreadsheet"
            | "text/csv" => Some(Self::Spreadsheet),
            "text/html" | "application/xhtml+xml" => Some(Self::WebPage),
            _ => None,
        }
    }

    /// Detect kind from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        mime_guess::from_path(filename)
            .iter()
            .find_map(|mime| Self::from_mime(mime.essence_str()))
    }

    /// Parse a kind name as sent by clients (`pdf`, `docx`, `excel`, `web`, ...)
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "spreadsheet" | "excel" | "xlsx" | "xls" | "csv" => Ok(Self::Spreadsheet),
            "web_page" | "webpage" | "web" | "html" => Ok(Self::WebPage),
            other => Err(Error::UnsupportedKind(other.to_string())),
        }
    }

    /// Resolve the kind of an uploaded file.
    ///
    /// An explicit kind wins, then the filename extension, then the part's content type.
    pub fn resolve(
        explicit: Option<&str>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<Self> {
        if let Some(name) = explicit {
            return Self::from_name(name);
        }
        Self::from_filename(filename)
            .or_else(|| content_type.and_then(Self::from_mime))
            .ok_or_else(|| {
                let ext = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or(filename);
                Error::UnsupportedKind(format!("'{}' ({})", ext, content_type.unwrap_or("unknown type")))
            })
    }

    /// MIME type sent when the document itself is attached to a model call
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::WebPage => "text/html",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Spreadsheet => "Spreadsheet",
            Self::WebPage => "Web Page",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A raw document received for one ingestion call
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw bytes (file content, or fetched HTML for web pages)
    pub bytes: Bytes,
    /// Declared kind
    pub kind: DocumentKind,
    /// Filename or URL
    pub source: String,
}

impl Document {
    /// Create a new document
    pub fn new(bytes: impl Into<Bytes>, kind: DocumentKind, source: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
            source: source.into(),
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document carries no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A contiguous slice of extracted text, the retrieval unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the document (0-indexed, dense)
    pub index: usize,
    /// Chunk text
    pub text: String,
    /// Filename or URL of the document
    pub source: String,
    /// Start offset in the extracted text, in characters
    pub char_start: usize,
    /// End offset (exclusive), in characters
    pub char_end: usize,
}
