//! Generative model trait

use async_trait::async_trait;

use crate::error::Result;
use crate::retrieval::Attachment;

/// Produces an answer from a fully built prompt
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (llama3.2, phi3, ...)
/// - `GeminiLlm`: Gemini API (gemini-1.5-flash)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt`, optionally with the original document attached
    async fn complete(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
