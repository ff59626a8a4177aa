//! Core types for document chat

pub mod chat;
pub mod document;

pub use chat::{ChatRequest, ChatResponse, ChatTurn, ErrorResponse, InitializeRequest, Role};
pub use document::{Chunk, Document, DocumentKind};
