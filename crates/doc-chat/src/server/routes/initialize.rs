//! Document initialization endpoints

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    Json,
};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Document, DocumentKind, InitializeRequest};

/// Which document kinds an initialize route accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// `/initialize`: every kind, files or URLs
    Any,
    /// `/document/initialize`: PDF and Word uploads
    Document,
    /// `/excel/initialize`: spreadsheet uploads
    Excel,
}

impl Page {
    fn allowed(&self) -> &'static [DocumentKind] {
        match self {
            Page::Any => &DocumentKind::ALL,
            Page::Document => &[DocumentKind::Pdf, DocumentKind::Docx],
            Page::Excel => &[DocumentKind::Spreadsheet],
        }
    }

    fn accepts_urls(&self) -> bool {
        matches!(self, Page::Any)
    }

    fn check(&self, kind: DocumentKind) -> Result<()> {
        if self.allowed().contains(&kind) {
            return Ok(());
        }
        let expected: Vec<&str> = self.allowed().iter().map(|k| k.display_name()).collect();
        Err(Error::UnsupportedKind(format!(
            "{} is not accepted here (expected {})",
            kind,
            expected.join(" or ")
        )))
    }
}

/// Fields of a multipart initialize request
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    kind: Option<String>,
    web_url: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// POST /initialize
pub async fn initialize(State(state): State<AppState>, request: Request) -> Result<StatusCode> {
    initialize_page(Page::Any, state, request).await
}

/// POST /document/initialize
pub async fn initialize_document(
    State(state): State<AppState>,
    request: Request,
) -> Result<StatusCode> {
    initialize_page(Page::Document, state, request).await
}

/// POST /excel/initialize
pub async fn initialize_excel(
    State(state): State<AppState>,
    request: Request,
) -> Result<StatusCode> {
    initialize_page(Page::Excel, state, request).await
}

async fn initialize_page(page: Page, state: AppState, request: Request) -> Result<StatusCode> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    let form = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| Error::input(e.body_text()))?;
        read_form(multipart).await?
    } else if content_type.contains("json") {
        let Json(body) = Json::<InitializeRequest>::from_request(request, &state)
            .await
            .map_err(|e| Error::input(e.body_text()))?;
        UploadForm {
            web_url: body.web_url,
            chunk_size: body.chunk_size,
            chunk_overlap: body.chunk_overlap,
            ..Default::default()
        }
    } else {
        return Err(Error::input(
            "expected multipart/form-data with a 'file' field or JSON with 'web_url'",
        ));
    };

    let defaults = state.config().chunking;
    let chunk_size = form.chunk_size.unwrap_or(defaults.chunk_size);
    let chunk_overlap = form.chunk_overlap.unwrap_or(defaults.chunk_overlap);

    let index = match (form.file, form.web_url) {
        (Some(file), _) => {
            let kind = DocumentKind::resolve(
                form.kind.as_deref(),
                &file.filename,
                file.content_type.as_deref(),
            )?;
            page.check(kind)?;
            let document = Document::new(file.bytes, kind, file.filename);
            state
                .coordinator()
                .ingest(document, chunk_size, chunk_overlap)
                .await?
        }
        (None, Some(url)) if page.accepts_urls() => {
            state
                .coordinator()
                .ingest_url(&url, chunk_size, chunk_overlap)
                .await?
        }
        (None, Some(_)) => {
            return Err(Error::input("this endpoint accepts file uploads only"));
        }
        (None, None) => return Err(Error::input("No file uploaded")),
    };

    tracing::info!(
        "Initialized session {} from {} ({} chunks)",
        index.id(),
        index.source(),
        index.len()
    );

    Ok(StatusCode::OK)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::input(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::input(format!("Failed to read file: {}", e)))?;
                tracing::debug!("Received file: {} ({} bytes)", filename, bytes.len());
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "kind" | "web_url" | "chunk_size" | "chunk_overlap" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::input(format!("Failed to read '{}': {}", name, e)))?;
                let value = value.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "kind" => form.kind = Some(value),
                    "web_url" => form.web_url = Some(value),
                    "chunk_size" => form.chunk_size = Some(parse_number(&name, &value)?),
                    _ => form.chunk_overlap = Some(parse_number(&name, &value)?),
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::input(format!("{} must be a non-negative integer, got '{}'", name, value)))
}
