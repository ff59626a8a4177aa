//! Question answering endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /chat - answer a question about the active document
///
/// Also mounted at `/chat/`, `/document/chat` and `/excel/chat`; every route
/// answers against the same single session.
pub async fn chat(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = body.map_err(|e| Error::input(e.body_text()))?;

    let answer = state
        .responder()
        .answer_with_sources(&request.question)
        .await?;

    Ok(Json(ChatResponse {
        response: answer.text,
        sources: request.include_sources.then_some(answer.sources),
    }))
}
