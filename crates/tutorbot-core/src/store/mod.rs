//! Storage abstraction for TutorBot.
//!
//! The [`Store`] trait defines the operations the ingest and ask pipelines
//! need. The only backend is [`memory::InMemoryStore`]; documents live for
//! the lifetime of the process.
//!
//! Implementations must be `Send + Sync` and must perform id assignment and
//! append as a single atomic step.

pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Document, DocumentSummary, NewDocument, RetrievalCandidate};

/// What happens when an insert would exceed `max_documents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFull {
    /// Fail the insert with [`StoreError::Full`].
    #[default]
    Reject,
    /// Drop the oldest document to make room.
    EvictOldest,
}

/// Growth limit for a store. `max_documents == 0` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CapacityPolicy {
    #[serde(default)]
    pub max_documents: usize,
    #[serde(default)]
    pub on_full: OnFull,
}

impl CapacityPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_bounded(&self) -> bool {
        self.max_documents > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store is full ({max_documents} documents)")]
    Full { max_documents: usize },

    #[error("document has {chunks} chunks but {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("document store lock poisoned")]
    Poisoned,
}

/// Abstract document store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](Store::insert) | Assign an id and append a document |
/// | [`len`](Store::len) | Number of stored documents |
/// | [`list`](Store::list) | Summaries in insertion order |
/// | [`get`](Store::get) | Full document by id |
/// | [`score_chunks`](Store::score_chunks) | Cosine-score every stored chunk |
#[async_trait]
pub trait Store: Send + Sync {
    /// Append a document, returning its summary with the assigned id.
    async fn insert(&self, doc: NewDocument) -> Result<DocumentSummary, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<Document>, StoreError>;

    /// Score every chunk of every document against `query_vec`.
    ///
    /// Candidates come back unsorted, in store order (documents by
    /// insertion, chunks by position) so callers can rank them stably.
    async fn score_chunks(&self, query_vec: &[f32]) -> Result<Vec<RetrievalCandidate>, StoreError>;
}
