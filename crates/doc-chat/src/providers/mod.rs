//! Provider abstractions for embeddings and answer generation
//!
//! Backends are selected from configuration: local Ollama, the Gemini API, or
//! (embeddings only) in-process token hashing.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;
pub mod retry;
pub mod token;

use std::sync::Arc;

use crate::config::{ChatConfig, EmbeddingBackend, LlmBackend};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiLlm};
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use retry::RetryPolicy;
pub use token::TokenEmbedder;

/// Embedding and generation providers selected by configuration
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

impl Providers {
    /// Build the configured providers, sharing one HTTP client per backend
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let mut ollama = None;
        let mut gemini = None;

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(shared(&mut ollama, || {
                OllamaClient::new(&config.ollama, &config.llm)
            })?)),
            EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::new(shared(&mut gemini, || {
                GeminiClient::new(&config.gemini, &config.llm)
            })?)),
            EmbeddingBackend::Token => Arc::new(TokenEmbedder::new(config.embeddings.dimensions)?),
        };

        let llm: Arc<dyn LlmProvider> = match config.llm.backend {
            LlmBackend::Ollama => Arc::new(OllamaLlm::new(shared(&mut ollama, || {
                OllamaClient::new(&config.ollama, &config.llm)
            })?)),
            LlmBackend::Gemini => Arc::new(GeminiLlm::new(shared(&mut gemini, || {
                GeminiClient::new(&config.gemini, &config.llm)
            })?)),
        };

        tracing::info!(
            "Providers: embeddings={}, llm={} ({})",
            embedder.name(),
            llm.name(),
            llm.model()
        );

        Ok(Self { embedder, llm })
    }
}

/// Reuse the client in `slot`, creating it on first use
fn shared<T>(slot: &mut Option<Arc<T>>, make: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
    if let Some(client) = slot {
        return Ok(Arc::clone(client));
    }
    let client = Arc::new(make()?);
    *slot = Some(Arc::clone(&client));
    Ok(client)
}
