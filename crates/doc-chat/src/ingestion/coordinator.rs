//! Turns a document into the active chat session

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::{Attachment, Index, IndexEntry, IndexHandle};
use crate::session::SessionStore;
use crate::types::{Document, DocumentKind};

use super::chunker::TextChunker;
use super::extractor::ExtractorRegistry;
use super::web::WebFetcher;

/// Extract, chunk, embed, index, then swap the session.
///
/// The session is only touched once every step succeeded, so a failed
/// ingestion leaves the previous document active.
pub struct IngestCoordinator {
    registry: ExtractorRegistry,
    embedder: Arc<dyn EmbeddingProvider>,
    session: Arc<SessionStore>,
    fetcher: WebFetcher,
    /// Concurrent embedding requests
    concurrency: usize,
    /// Keep PDF bytes for model calls
    attach_document: bool,
}

impl IngestCoordinator {
    pub fn new(
        config: &ChatConfig,
        registry: ExtractorRegistry,
        embedder: Arc<dyn EmbeddingProvider>,
        session: Arc<SessionStore>,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            embedder,
            session,
            fetcher: WebFetcher::new(&config.web)?,
            concurrency: config.embeddings.concurrency(),
            attach_document: config.retrieval.attach_document,
        })
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Ingest `document` and make it the active session
    pub async fn ingest(
        &self,
        document: Document,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<IndexHandle> {
        let chunker = TextChunker::new(chunk_size, chunk_overlap)?;
        if document.is_empty() {
            return Err(Error::input(format!("'{}' is empty", document.source)));
        }
        let extractor = self.registry.get(document.kind)?;

        let started = Instant::now();
        tracing::info!(
            "[{}] Ingesting {} ({} bytes, chunk_size={}, chunk_overlap={})",
            document.source,
            document.kind,
            document.len(),
            chunk_size,
            chunk_overlap
        );

        let bytes = document.bytes.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| Error::internal(format!("extraction task failed: {}", e)))?
            .map_err(|e| e.into_extraction_failure(&document.source))?;

        let chunks = chunker.split(&text, &document.source);
        if chunks.is_empty() {
            return Err(Error::extraction(&document.source, "no text found in document"));
        }
        tracing::info!(
            "[{}] Extracted {} chars into {} chunks",
            document.source,
            text.chars().count(),
            chunks.len()
        );

        let embedder = &self.embedder;
        let entries: Vec<IndexEntry> = stream::iter(chunks)
            .map(|chunk| async move {
                let embedding = embedder
                    .embed(&chunk.text)
                    .await
                    .map_err(Error::into_embedding_failure)?;
                Ok::<_, Error>(IndexEntry { chunk, embedding })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut index = Index::build(&document, entries, chunk_size, chunk_overlap)?;
        if self.attach_document && document.kind == DocumentKind::Pdf {
            index = index.with_attachment(Attachment {
                bytes: document.bytes.clone(),
                mime_type: document.kind.mime_type().to_string(),
            });
        }

        let (handle, previous) = self.session.replace(index);
        tracing::info!(
            "[{}] Session {} ready: {} chunks, {} dimensions in {:?}{}",
            document.source,
            handle.id(),
            handle.len(),
            handle.dimensions(),
            started.elapsed(),
            previous
                .map(|p| format!(" (replaced {})", p.source()))
                .unwrap_or_default()
        );

        Ok(handle)
    }

    /// Fetch `url` and ingest it
    pub async fn ingest_url(
        &self,
        url: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<IndexHandle> {
        TextChunker::new(chunk_size, chunk_overlap)?;
        let url = WebFetcher::parse_url(url)?;
        let document = self.fetcher.fetch(&url).await?;
        self.ingest(document, chunk_size, chunk_overlap).await
    }
}
