//! The single active chat session

use parking_lot::RwLock;
use std::sync::Arc;

use crate::retrieval::{Index, IndexHandle};

/// Holds at most one index.
///
/// Readers clone the handle, so an index stays alive for in-flight chats even
/// after a newer ingestion replaced it.
#[derive(Debug, Default)]
pub struct SessionStore {
    slot: RwLock<Option<IndexHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `index` the active session, returning the one it replaced
    pub fn replace(&self, index: Index) -> (IndexHandle, Option<IndexHandle>) {
        let handle = Arc::new(index);
        let previous = self.slot.write().replace(Arc::clone(&handle));
        (handle, previous)
    }

    /// The active index, if any document was initialized
    pub fn current(&self) -> Option<IndexHandle> {
        self.slot.read().clone()
    }

    /// Whether a document was initialized
    pub fn is_initialized(&self) -> bool {
        self.slot.read().is_some()
    }
}
