//! Application state for the chat server

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::generation::ChatResponder;
use crate::ingestion::{ExtractorRegistry, IngestCoordinator};
use crate::providers::Providers;
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ChatConfig,
    /// The single active session
    session: Arc<SessionStore>,
    /// Embedding and generation providers
    providers: Providers,
    /// Ingestion pipeline
    coordinator: IngestCoordinator,
    /// Question answering
    responder: ChatResponder,
    /// Process start, reported by `/info`
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with providers built from configuration
    pub fn new(config: ChatConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Self::with_providers(config, providers, ExtractorRegistry::default())
    }

    /// Create state around existing providers and extractors
    pub fn with_providers(
        config: ChatConfig,
        providers: Providers,
        registry: ExtractorRegistry,
    ) -> Result<Self> {
        tracing::info!(
            "Initializing chat state (embeddings: {}, llm: {}, kinds: {:?})",
            providers.embedder.name(),
            providers.llm.name(),
            registry.kinds()
        );

        let session = Arc::new(SessionStore::new());
        let coordinator = IngestCoordinator::new(
            &config,
            registry,
            Arc::clone(&providers.embedder),
            Arc::clone(&session),
        )?;
        let responder = ChatResponder::new(
            Arc::clone(&session),
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.llm),
            config.retrieval.top_k,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                providers,
                coordinator,
                responder,
                started_at: Utc::now(),
            }),
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    pub fn coordinator(&self) -> &IngestCoordinator {
        &self.inner.coordinator
    }

    pub fn responder(&self) -> &ChatResponder {
        &self.inner.responder
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Ready once a document has been initialized
    pub fn is_ready(&self) -> bool {
        self.inner.session.is_initialized()
    }
}
