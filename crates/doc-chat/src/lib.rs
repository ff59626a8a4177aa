//! doc-chat: chat with a PDF, Word document, spreadsheet or web page
//!
//! One document at a time is extracted, chunked, embedded and kept in memory as
//! the active session. Questions are answered by retrieving the most similar
//! chunks and handing them, with the question, to a generative model.

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use client::ChatClient;
pub use config::ChatConfig;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use generation::{ChatAnswer, ChatResponder};
pub use ingestion::IngestCoordinator;
pub use retrieval::{Index, IndexHandle, ScoredChunk};
pub use session::SessionStore;
pub use types::{Chunk, ChatTurn, Document, DocumentKind};
