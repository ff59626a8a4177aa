//! API routes for the chat server

pub mod chat;
pub mod initialize;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Initialization - with larger body limit for file uploads
        .route(
            "/initialize",
            post(initialize::initialize).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/document/initialize",
            post(initialize::initialize_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/excel/initialize",
            post(initialize::initialize_excel).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Chat; browser clients post to the trailing-slash form
        .route("/chat", post(chat::chat))
        .route("/chat/", post(chat::chat))
        .route("/document/chat", post(chat::chat))
        .route("/excel/chat", post(chat::chat))
        // Session
        .route("/session", get(session::current_session))
        .route("/info", get(session::info))
}
