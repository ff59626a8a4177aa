//! Session and service metadata endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::server::state::AppState;
use crate::types::ErrorResponse;

/// GET /session - metadata of the active index
pub async fn current_session(State(state): State<AppState>) -> Response {
    match state.session().current() {
        Some(index) => Json(index.summary()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                detail: "No document has been initialized yet".to_string(),
                error: Some("not_initialized".to_string()),
            }),
        )
            .into_response(),
    }
}

/// GET /info - service description
pub async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let providers = state.providers();
    let kinds: Vec<_> = state.coordinator().registry().kinds();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat with a PDF, Word document, spreadsheet or web page",
        "started_at": state.started_at(),
        "initialized": state.is_ready(),
        "supported_kinds": kinds,
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "retrieval": {
            "top_k": state.responder().top_k(),
            "metric": "cosine",
            "attach_document": config.retrieval.attach_document,
        },
        "providers": {
            "embeddings": providers.embedder.name(),
            "embedding_dimensions": providers.embedder.dimensions(),
            "llm": providers.llm.name(),
            "model": providers.llm.model(),
        },
        "endpoints": {
            "POST /initialize": "Upload a file (multipart 'file') or JSON {web_url} to start a session",
            "POST /chat": "Ask a question: {question} -> {response}",
            "POST /document/initialize": "Upload a PDF or Word document",
            "POST /document/chat": "Ask about the uploaded document",
            "POST /excel/initialize": "Upload a spreadsheet",
            "POST /excel/chat": "Ask about the uploaded spreadsheet",
            "GET /session": "Active document metadata",
            "GET /health": "Liveness",
            "GET /ready": "200 once a document is initialized"
        }
    }))
}
