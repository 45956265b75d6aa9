//! Core data models shared by the store, the retriever, and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An ingested document together with its derived chunks and vectors.
///
/// `chunks` and `embeddings` are parallel: `embeddings[i]` is the vector
/// of `chunks[i]`, and chunks are kept in source order.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: u64,
    pub title: String,
    pub text: String,
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title.clone(),
            num_chunks: self.chunks.len(),
            created_at: self.created_at,
        }
    }
}

/// A document that has been chunked and embedded but not yet stored.
///
/// The store assigns the id and creation time on insert.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub text: String,
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

/// Lightweight listing view of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: u64,
    pub title: String,
    pub num_chunks: usize,
    pub created_at: DateTime<Utc>,
}

/// One scored chunk produced for a single query. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalCandidate {
    pub chunk: String,
    pub score: f32,
    pub doc_id: u64,
}
