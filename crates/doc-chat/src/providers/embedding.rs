//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a vector for similarity search
///
/// Implementations:
/// - `OllamaEmbedder`: local Ollama server (nomic-embed-text)
/// - `GeminiEmbedder`: Gemini API (embedding-001)
/// - `TokenEmbedder`: in-process token hashing, no network
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding of one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimensions, when known before the first call
    fn dimensions(&self) -> Option<usize>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
