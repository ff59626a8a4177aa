//! Configuration for the document chat service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chunking defaults (requests may override per ingestion)
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Generative model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Ollama endpoint
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Gemini endpoint
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Web page fetching
    #[serde(default)]
    pub web: WebConfig,
}

impl ChatConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ChatConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, the default location, or built-in defaults.
    ///
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    tracing::info!("Loading configuration from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (`<config dir>/doc-chat/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("doc-chat").join("config.toml"))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                self.gemini.api_key = Some(key);
            }
        }
        if let Ok(host) = std::env::var("DOC_CHAT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOC_CHAT_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid DOC_CHAT_PORT={}", port),
            }
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size
        {
            return Err(Error::Config(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                self.chunking.chunk_size, self.chunking.chunk_overlap
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        let needs_gemini = self.embeddings.backend == EmbeddingBackend::Gemini
            || self.llm.backend == LlmBackend::Gemini;
        if needs_gemini && self.gemini.api_key.is_none() {
            tracing::warn!("Gemini backend selected but no API key configured (set GOOGLE_API_KEY)");
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters repeated between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks forwarded to the model
    pub top_k: usize,
    /// Attach the original PDF to every model call alongside the retrieved chunks
    pub attach_document: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            attach_document: false,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Gemini API (API key)
    Gemini,
    /// In-process token hashing, no network
    Token,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend used for chunk and question embeddings
    pub backend: EmbeddingBackend,
    /// Dimensions produced by the token backend
    pub dimensions: usize,
    /// Concurrent embedding requests per ingestion (default: CPU count, max 8)
    pub parallel_requests: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            dimensions: 384,
            parallel_requests: None,
        }
    }
}

impl EmbeddingConfig {
    /// Effective embedding concurrency
    pub fn concurrency(&self) -> usize {
        self.parallel_requests
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

/// Generative model backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Gemini API (API key)
    Gemini,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend used for answers
    pub backend: LlmBackend,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Ollama endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
        }
    }
}

/// Gemini endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (usually from GOOGLE_API_KEY)
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Generation model
    pub generation_model: String,
    /// Embedding model
    pub embedding_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generation_model: "gemini-1.5-flash".to_string(),
            embedding_model: "embedding-001".to_string(),
        }
    }
}

/// Web page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Fetch timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with page requests
    pub user_agent: String,
    /// Largest page body accepted, in bytes
    pub max_page_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("doc-chat/", env!("CARGO_PKG_VERSION")).to_string(),
            max_page_bytes: 10 * 1024 * 1024,
        }
    }
}
