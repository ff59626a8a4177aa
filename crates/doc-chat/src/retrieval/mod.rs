//! In-memory vector index and similarity ranking

mod index;

pub use index::{cosine_similarity, Attachment, Index, IndexEntry, IndexHandle, IndexSummary, ScoredChunk};
