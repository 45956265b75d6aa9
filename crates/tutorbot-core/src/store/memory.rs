//! In-memory [`Store`] implementation.
//!
//! Documents and the id counter share one `std::sync::RwLock`, so reading
//! the counter, incrementing it, and appending happen in a single critical
//! section. Scoring is brute-force cosine similarity over every stored chunk.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::embedding::cosine_similarity;
use crate::models::{Document, DocumentSummary, NewDocument, RetrievalCandidate};

use super::{CapacityPolicy, OnFull, Store, StoreError};

struct Inner {
    docs: VecDeque<Document>,
    next_id: u64,
}

/// Process-lifetime document store.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    capacity: CapacityPolicy,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity_policy(CapacityPolicy::unbounded())
    }

    pub fn with_capacity_policy(capacity: CapacityPolicy) -> Self {
        Self {
            inner: RwLock::new(Inner {
                docs: VecDeque::new(),
                next_id: 0,
            }),
            capacity,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert(&self, doc: NewDocument) -> Result<DocumentSummary, StoreError> {
        if doc.chunks.len() != doc.embeddings.len() {
            return Err(StoreError::LengthMismatch {
                chunks: doc.chunks.len(),
                embeddings: doc.embeddings.len(),
            });
        }

        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if self.capacity.is_bounded() {
            while inner.docs.len() >= self.capacity.max_documents {
                match self.capacity.on_full {
                    OnFull::Reject => {
                        return Err(StoreError::Full {
                            max_documents: self.capacity.max_documents,
                        })
                    }
                    OnFull::EvictOldest => {
                        inner.docs.pop_front();
                    }
                }
            }
        }

        let stored = Document {
            id: inner.next_id,
            title: doc.title,
            text: doc.text,
            chunks: doc.chunks,
            embeddings: doc.embeddings,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        let summary = stored.summary();
        inner.docs.push_back(stored);
        Ok(summary)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.docs.len())
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.docs.iter().map(Document::summary).collect())
    }

    async fn get(&self, id: u64) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.docs.iter().find(|d| d.id == id).cloned())
    }

    async fn score_chunks(&self, query_vec: &[f32]) -> Result<Vec<RetrievalCandidate>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let candidates = inner
            .docs
            .iter()
            .flat_map(|doc| {
                doc.chunks
                    .iter()
                    .zip(doc.embeddings.iter())
                    .map(move |(chunk, emb)| RetrievalCandidate {
                        chunk: chunk.clone(),
                        score: cosine_similarity(query_vec, emb),
                        doc_id: doc.id,
                    })
            })
            .collect();
        Ok(candidates)
    }
}
