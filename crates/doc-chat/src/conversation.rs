//! Client-side chat history

use std::future::Future;

use crate::error::{Error, Result};
use crate::types::ChatTurn;

/// Ordered, append-only list of turns.
///
/// A question and its answer are recorded together, and only once the answer
/// arrived; a failed question leaves the history unchanged.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Ask `question` through `answer`, recording both turns on success
    pub async fn ask<F, Fut>(&mut self, question: &str, answer: F) -> Result<&str>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::input("question must not be empty"));
        }

        let reply = answer(question.to_string()).await?;
        self.turns.push(ChatTurn::user(question));
        self.turns.push(ChatTurn::assistant(reply));

        Ok(self
            .turns
            .last()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default())
    }
}
