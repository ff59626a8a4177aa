//! HTTP client for a running chat server

use reqwest::{multipart, Client, Response};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::retrieval::IndexSummary;
use crate::types::{ChatRequest, ChatResponse, ErrorResponse, InitializeRequest};

/// Talks to the `/initialize` and `/chat` endpoints
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:8000`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a file as the new session document
    pub async fn initialize_file(
        &self,
        path: &Path,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime.essence_str())
            .map_err(|e| Error::input(format!("invalid content type: {}", e)))?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(size) = chunk_size {
            form = form.text("chunk_size", size.to_string());
        }
        if let Some(overlap) = chunk_overlap {
            form = form.text("chunk_overlap", overlap.to_string());
        }

        let response = self
            .client
            .post(self.url("/initialize"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(|_| ())
    }

    /// Make a web page the new session document
    pub async fn initialize_url(
        &self,
        url: &str,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Result<()> {
        let request = InitializeRequest {
            web_url: Some(url.to_string()),
            chunk_size,
            chunk_overlap,
        };
        let response = self
            .client
            .post(self.url("/initialize"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(|_| ())
    }

    /// Ask a question about the session document
    pub async fn chat(&self, question: &str) -> Result<String> {
        Ok(self.chat_with(&ChatRequest::new(question)).await?.response)
    }

    /// Send a full chat request, e.g. to ask for sources
    pub async fn chat_with(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.url("/chat/"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::internal(format!("invalid chat response: {}", e)))
    }

    /// Metadata of the active session, if any
    pub async fn session(&self) -> Result<Option<IndexSummary>> {
        let response = self
            .client
            .get(self.url("/session"))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let summary = check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::internal(format!("invalid session response: {}", e)))?;
        Ok(Some(summary))
    }

    /// Whether the server answers its health check
    pub async fn health(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::internal(format!("request failed: {}", e))
}

/// Turn an error body back into the matching error kind
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (detail, kind) = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => (body.detail, body.error.unwrap_or_default()),
        Err(_) => (format!("HTTP {}: {}", status, text), String::new()),
    };

    Err(match kind.as_str() {
        "input_error" => Error::Input(detail),
        "unsupported_kind" => Error::UnsupportedKind(detail),
        "extraction_failed" => Error::extraction("server", detail),
        "embedding_failed" => Error::EmbeddingFailed(detail),
        "retrieval_failed" => Error::RetrievalFailed(detail),
        "model_failed" => Error::ModelFailed(detail),
        "not_initialized" => Error::NotInitialized,
        _ => Error::Internal(detail),
    })
}
