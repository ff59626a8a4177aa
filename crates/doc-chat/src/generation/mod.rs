//! Prompt construction and the chat responder

pub mod prompt;
mod responder;

pub use prompt::PromptBuilder;
pub use responder::{ChatAnswer, ChatResponder};
