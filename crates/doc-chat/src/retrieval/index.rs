//! The immutable index built by one ingestion

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, DocumentKind};

/// Shared handle to an index; cloned by every reader
pub type IndexHandle = Arc<Index>;

/// Original document bytes forwarded to the generative model
#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// One chunk with its embedding
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Searchable embeddings of a single document.
///
/// Built wholesale by ingestion and never mutated afterwards. Ranking is
/// cosine similarity, highest first, ties broken by chunk order.
#[derive(Debug)]
pub struct Index {
    id: Uuid,
    source: String,
    kind: DocumentKind,
    entries: Vec<IndexEntry>,
    dimensions: usize,
    content_hash: String,
    created_at: DateTime<Utc>,
    chunk_size: usize,
    chunk_overlap: usize,
    attachment: Option<Attachment>,
}

/// Metadata of an index, as reported by `GET /session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub id: Uuid,
    pub source: String,
    pub kind: DocumentKind,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub has_attachment: bool,
}

impl Index {
    /// Build an index over `entries` for `document`.
    ///
    /// Every embedding must have the same, non-zero length.
    pub fn build(
        document: &Document,
        entries: Vec<IndexEntry>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self> {
        let dimensions = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if dimensions == 0 {
            return Err(Error::embedding(format!(
                "no embeddings produced for '{}'",
                document.source
            )));
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(Error::embedding(format!(
                "chunk {} has {} dimensions, expected {}",
                bad.chunk.index,
                bad.embedding.len(),
                dimensions
            )));
        }

        let content_hash = hex::encode(Sha256::digest(&document.bytes));

        Ok(Self {
            id: Uuid::new_v4(),
            source: document.source.clone(),
            kind: document.kind,
            entries,
            dimensions,
            content_hash,
            created_at: Utc::now(),
            chunk_size,
            chunk_overlap,
            attachment: None,
        })
    }

    /// Keep the original document so it can be attached to model calls
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            id: self.id,
            source: self.source.clone(),
            kind: self.kind,
            chunk_count: self.entries.len(),
            dimensions: self.dimensions,
            content_hash: self.content_hash.clone(),
            created_at: self.created_at,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            has_attachment: self.attachment.is_some(),
        }
    }

    /// Return the `k` chunks most similar to `query`
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::retrieval(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

/// Cosine similarity of two equal-length vectors; 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_nan() {
        0.0
    } else {
        score
    }
}
