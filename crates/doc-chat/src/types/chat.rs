//! Request, response and conversation types shared by the server and the client

use serde::{Deserialize, Serialize};

use crate::retrieval::ScoredChunk;

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The question to answer (`message` is accepted as well)
    #[serde(default, alias = "message")]
    pub question: String,
    /// Return the retrieved chunks with the answer
    #[serde(default)]
    pub include_sources: bool,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            include_sources: false,
        }
    }
}

/// Successful reply of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model answer
    pub response: String,
    /// Retrieved chunks, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<ScoredChunk>>,
}

/// JSON body of `POST /initialize` for web content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Page to fetch and index
    #[serde(default)]
    pub web_url: Option<String>,
    /// Chunk size override
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// Chunk overlap override
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub detail: String,
    /// Machine readable kind
    #[serde(default)]
    pub error: Option<String>,
}
