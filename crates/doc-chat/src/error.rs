//! Error types for document chat

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for document chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Document chat errors
///
/// Every collaborator failure (parser, embedding model, generative model) is
/// converted into one of these kinds at the component boundary that called it.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid caller input (file, URL, question, chunk parameters)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Document kind without a registered extractor
    #[error("Unsupported document kind: {0}")]
    UnsupportedKind(String),

    /// Text extraction failed (parser error, corrupt input, unreachable page)
    #[error("Failed to extract text from '{source_id}': {message}")]
    ExtractionFailed { source_id: String, message: String },

    /// Embedding collaborator failed
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Retrieval over the active index failed
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Generative model failed (including rate limiting and malformed responses)
    #[error("Model failed: {0}")]
    ModelFailed(String),

    /// Chat requested before any document was initialized
    #[error("No document has been initialized yet")]
    NotInitialized,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Create an extraction error
    pub fn extraction(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingFailed(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::RetrievalFailed(message.into())
    }

    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::ModelFailed(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Reclassify a failure coming back from the embedding collaborator.
    pub fn into_embedding_failure(self) -> Self {
        match self {
            Self::EmbeddingFailed(_) => self,
            other => Self::EmbeddingFailed(other.to_string()),
        }
    }

    /// Reclassify a failure raised while ranking the index for a question.
    pub fn into_retrieval_failure(self) -> Self {
        match self {
            Self::RetrievalFailed(_) => self,
            Self::EmbeddingFailed(msg) => Self::RetrievalFailed(format!("query embedding: {}", msg)),
            other => Self::RetrievalFailed(other.to_string()),
        }
    }

    /// Reclassify a failure coming back from the generative model.
    pub fn into_model_failure(self) -> Self {
        match self {
            Self::ModelFailed(_) => self,
            other => Self::ModelFailed(other.to_string()),
        }
    }

    /// Reclassify a failure coming back from an extractor, tagged with `source_id`.
    pub fn into_extraction_failure(self, source_id: &str) -> Self {
        match self {
            Self::UnsupportedKind(_) => self,
            Self::ExtractionFailed { message, .. } => Self::extraction(source_id, message),
            other => Self::extraction(source_id, other.to_string()),
        }
    }

    /// Short machine-readable kind, used in HTTP bodies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "input_error",
            Error::UnsupportedKind(_) => "unsupported_kind",
            Error::ExtractionFailed { .. } => "extraction_failed",
            Error::EmbeddingFailed(_) => "embedding_failed",
            Error::RetrievalFailed(_) => "retrieval_failed",
            Error::ModelFailed(_) => "model_failed",
            Error::NotInitialized => "not_initialized",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Input(_)
            | Error::UnsupportedKind(_)
            | Error::ExtractionFailed { .. }
            | Error::NotInitialized => StatusCode::BAD_REQUEST,
            Error::EmbeddingFailed(_)
            | Error::RetrievalFailed(_)
            | Error::ModelFailed(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }

        // Browser clients read `detail`
        let body = Json(json!({
            "detail": self.to_string(),
            "error": self.kind(),
        }));

        (status, body).into_response()
    }
}
