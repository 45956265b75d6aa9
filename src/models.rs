//! Request and response bodies for the two tutoring operations.
//!
//! Field names match the JSON the browser UI sends and expects.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use tutorbot_core::models::{Document, DocumentSummary, RetrievalCandidate};

/// Body of `POST /ingest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    pub doc_id: u64,
    pub num_chunks: usize,
}

/// Body of `POST /chat` and `POST /ask`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub ok: bool,
    pub answer: String,
    /// The chunks handed to the model, most relevant first.
    pub retrieved: Vec<RetrievalCandidate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub ok: bool,
    pub documents: Vec<DocumentSummary>,
}

/// Body of `GET /documents/{id}`. Embeddings are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResponse {
    pub ok: bool,
    pub id: u64,
    pub title: String,
    pub text: String,
    pub chunks: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            ok: true,
            id: doc.id,
            title: doc.title,
            text: doc.text,
            chunks: doc.chunks,
            created_at: doc.created_at,
        }
    }
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}
