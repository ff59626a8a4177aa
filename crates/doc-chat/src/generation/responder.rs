//! Answers questions against the active session

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::ScoredChunk;
use crate::session::SessionStore;

use super::prompt::PromptBuilder;

/// An answer together with what it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    /// Model output, returned verbatim
    pub text: String,
    /// Retrieved chunks, best first
    pub sources: Vec<ScoredChunk>,
    /// Prompt sent to the model
    pub prompt: String,
    /// Index the question was answered against
    pub index_id: Uuid,
}

/// Retrieval-augmented question answering.
///
/// Stateless across calls: every question is answered against whichever index
/// is active when it arrives. Collaborator failures are not retried here.
pub struct ChatResponder {
    session: Arc<SessionStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl ChatResponder {
    pub fn new(
        session: Arc<SessionStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            session,
            embedder,
            llm,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` from the active document
    pub async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.answer_with_sources(question).await?.text)
    }

    /// Answer `question` and report the retrieved chunks and prompt
    pub async fn answer_with_sources(&self, question: &str) -> Result<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::input("question must not be empty"));
        }

        let index = self.session.current().ok_or(Error::NotInitialized)?;

        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(Error::into_retrieval_failure)?;
        let sources = index.top_k(&query, self.top_k)?;

        tracing::debug!(
            index = %index.id(),
            retrieved = sources.len(),
            best_score = sources.first().map(|s| s.score).unwrap_or(0.0),
            "Retrieved context"
        );

        let attachment = index.attachment();
        let prompt = PromptBuilder::for_question(question, &sources, attachment.is_some());

        let text = self
            .llm
            .complete(&prompt, attachment)
            .await
            .map_err(Error::into_model_failure)?;

        tracing::info!(
            index = %index.id(),
            model = self.llm.model(),
            "Answered question ({} chars)",
            text.len()
        );

        Ok(ChatAnswer {
            text,
            sources,
            prompt,
            index_id: index.id(),
        })
    }
}
