//! Ingest and ask orchestration.
//!
//! [`Tutor`] owns the document store and the two provider clients and
//! implements the two operations the HTTP layer exposes:
//!
//! ```text
//! ingest:  text ─▶ chunk ─▶ embed ─▶ store.insert
//! ask:     question ─▶ retrieve (embed + score) ─▶ compose ─▶ chat
//! ```
//!
//! Ids are assigned by the store at insert time, so an ingest that fails at
//! the embedding step leaves both the store and the id counter untouched.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use tutorbot_core::chunk::{chunk_text, ChunkParams};
use tutorbot_core::embedding::{Embedder, EmbeddingError};
use tutorbot_core::models::{DocumentSummary, NewDocument};
use tutorbot_core::prompt::{compose, DEFAULT_STYLE};
use tutorbot_core::retrieve::{retrieve, RetrieveError};
use tutorbot_core::store::memory::InMemoryStore;
use tutorbot_core::store::{Store, StoreError};

use crate::chat::{ChatError, ChatGateway};
use crate::config::Config;
use crate::models::{AskRequest, AskResponse, DocumentResponse, IngestRequest, IngestResponse};

/// Everything that can go wrong while serving an ingest or ask.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("No text provided.")]
    EmptyText,

    #[error("No question provided.")]
    EmptyQuestion,

    #[error("No document with id {0}.")]
    DocumentNotFound(u64),

    #[error("Embedding provider error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Chat provider error: {0}")]
    Chat(#[from] ChatError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl TutorError {
    /// True for errors the caller can fix by resubmitting different input.
    pub fn is_validation(&self) -> bool {
        matches!(self, TutorError::EmptyText | TutorError::EmptyQuestion)
    }
}

impl From<RetrieveError> for TutorError {
    fn from(err: RetrieveError) -> Self {
        match err {
            RetrieveError::Embedding(e) => TutorError::Embedding(e),
            RetrieveError::Store(e) => TutorError::Store(e),
        }
    }
}

/// Per-request tuning taken from config.
#[derive(Debug, Clone)]
pub struct TutorSettings {
    pub chunking: ChunkParams,
    pub top_k: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl TutorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunking: config.chunking,
            top_k: config.retrieval.top_k,
            max_tokens: config.chat.max_tokens,
            temperature: config.chat.temperature,
        }
    }
}

pub struct Tutor {
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatGateway>,
    settings: TutorSettings,
}

impl Tutor {
    pub fn new(
        store: Arc<dyn Store>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatGateway>,
        settings: TutorSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
            settings,
        }
    }

    /// Build a tutor with a fresh in-memory store sized by `config.store`.
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatGateway>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::with_capacity_policy(config.store));
        Self::new(store, embedder, chat, TutorSettings::from_config(config))
    }

    /// Chunk, embed, and store a document.
    pub async fn ingest(&self, req: IngestRequest) -> Result<IngestResponse, TutorError> {
        let text = req.text.as_deref().unwrap_or_default().trim();
        if text.is_empty() {
            return Err(TutorError::EmptyText);
        }

        let title = req
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(default_title);

        let chunks = chunk_text(text, &self.settings.chunking);
        let embeddings = self.embedder.embed(&chunks).await.map_err(|e| {
            warn!(
                error = %e,
                model = self.embedder.model_name(),
                title = %title,
                "Embedding failed during ingest"
            );
            e
        })?;

        let summary = self
            .store
            .insert(NewDocument {
                title,
                text: text.to_string(),
                chunks,
                embeddings,
            })
            .await?;

        info!(
            doc_id = summary.id,
            num_chunks = summary.num_chunks,
            title = %summary.title,
            "Ingested document"
        );

        Ok(IngestResponse {
            ok: true,
            doc_id: summary.id,
            num_chunks: summary.num_chunks,
        })
    }

    /// Answer a question from the stored material.
    pub async fn ask(&self, req: AskRequest) -> Result<AskResponse, TutorError> {
        let question = req.question.as_deref().unwrap_or_default().trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        let style = req
            .style
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STYLE);

        let retrieved = retrieve(
            self.store.as_ref(),
            self.embedder.as_ref(),
            question,
            self.settings.top_k,
        )
        .await?;

        let messages = compose(style, question, &retrieved);
        let answer = self
            .chat
            .complete(
                &messages,
                self.settings.max_tokens,
                self.settings.temperature,
            )
            .await
            .map_err(|e| {
                warn!(error = %e, model = self.chat.model_name(), "Chat completion failed");
                e
            })?;

        info!(
            retrieved = retrieved.len(),
            style = %style,
            "Answered question"
        );

        Ok(AskResponse {
            ok: true,
            answer,
            retrieved,
        })
    }

    pub async fn documents(&self) -> Result<Vec<DocumentSummary>, TutorError> {
        Ok(self.store.list().await?)
    }

    /// Full stored document, chunks included.
    pub async fn document(&self, id: u64) -> Result<DocumentResponse, TutorError> {
        self.store
            .get(id)
            .await?
            .map(DocumentResponse::from)
            .ok_or(TutorError::DocumentNotFound(id))
    }

    pub async fn document_count(&self) -> Result<usize, TutorError> {
        Ok(self.store.len().await?)
    }
}

fn default_title() -> String {
    format!("doc_{}", Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tutorbot_core::prompt::{ChatMessage, NO_SOURCES};

    /// One dimension per keyword; deterministic and offline.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        if t.contains("chlorophyll") { 1.0 } else { 0.0 },
                        if t.contains("ocean") { 1.0 } else { 0.0 },
                        0.1,
                    ]
                })
                .collect())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        fn model_name(&self) -> &str {
            "broken"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Api {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    /// Records the messages it receives and answers from a script.
    struct RecordingChat {
        reply: Result<String, u16>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingChat {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_user_message(&self) -> String {
            let seen = self.seen.lock().unwrap();
            seen.last().unwrap()[1].content.clone()
        }
    }

    #[async_trait]
    impl ChatGateway for RecordingChat {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            _max_output_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(ChatError::Api {
                    status: *status,
                    body: "denied".to_string(),
                }),
            }
        }
    }

    fn tutor_with(embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatGateway>) -> Tutor {
        Tutor::from_config(&Config::default(), embedder, chat)
    }

    fn ingest_req(text: &str) -> IngestRequest {
        IngestRequest {
            text: Some(text.to_string()),
            title: None,
        }
    }

    fn ask_req(question: &str) -> AskRequest {
        AskRequest {
            question: Some(question.to_string()),
            style: None,
        }
    }

    #[tokio::test]
    async fn test_ingest_short_text() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::answering("")));
        let resp = tutor
            .ingest(ingest_req(
                "Photosynthesis converts light into energy. Plants use chlorophyll.",
            ))
            .await
            .unwrap();
        assert_eq!(
            resp,
            IngestResponse {
                ok: true,
                doc_id: 0,
                num_chunks: 1
            }
        );
    }

    #[tokio::test]
    async fn test_sequential_ingests_get_sequential_ids() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::answering("")));
        let a = tutor.ingest(ingest_req("first")).await.unwrap();
        let b = tutor.ingest(ingest_req("second")).await.unwrap();
        assert_eq!((a.doc_id, b.doc_id), (0, 1));
    }

    #[tokio::test]
    async fn test_ingest_empty_text_rejected() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::answering("")));
        for req in [ingest_req(""), ingest_req("   \n "), IngestRequest::default()] {
            let err = tutor.ingest(req).await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "No text provided.");
        }
        assert_eq!(tutor.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_embedding_failure_leaves_store_unchanged() {
        let tutor = tutor_with(Arc::new(BrokenEmbedder), Arc::new(RecordingChat::answering("")));
        let err = tutor.ingest(ingest_req("some notes")).await.unwrap_err();
        assert!(matches!(err, TutorError::Embedding(_)));
        assert!(!err.is_validation());
        assert_eq!(tutor.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_title_defaults_when_blank() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::answering("")));
        tutor
            .ingest(IngestRequest {
                text: Some("notes".to_string()),
                title: Some("  ".to_string()),
            })
            .await
            .unwrap();
        tutor
            .ingest(IngestRequest {
                text: Some("more notes".to_string()),
                title: Some(" Biology 101 ".to_string()),
            })
            .await
            .unwrap();
        let docs = tutor.documents().await.unwrap();
        assert!(docs[0].title.starts_with("doc_"));
        assert_eq!(docs[1].title, "Biology 101");
    }

    #[tokio::test]
    async fn test_ask_with_empty_store() {
        let chat = Arc::new(RecordingChat::answering("I don't see that in the provided material."));
        let tutor = tutor_with(Arc::new(BrokenEmbedder), chat.clone());
        // BrokenEmbedder proves no embedding call happens on an empty store.
        let resp = tutor.ask(ask_req("What is ATP?")).await.unwrap();
        assert!(resp.ok);
        assert!(resp.retrieved.is_empty());
        assert!(chat.last_user_message().contains(NO_SOURCES));
    }

    #[tokio::test]
    async fn test_ask_uses_retrieved_chunks() {
        let chat = Arc::new(RecordingChat::answering("  Chlorophyll is green.  "));
        let tutor = tutor_with(Arc::new(KeywordEmbedder), chat.clone());
        tutor.ingest(ingest_req("The ocean is salty.")).await.unwrap();
        tutor
            .ingest(ingest_req("Plants use chlorophyll to capture light."))
            .await
            .unwrap();

        let resp = tutor
            .ask(AskRequest {
                question: Some("What does chlorophyll do?".to_string()),
                style: Some("Analogy-first".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(resp.answer, "  Chlorophyll is green.  ");
        assert_eq!(resp.retrieved.len(), 2);
        assert_eq!(resp.retrieved[0].doc_id, 1);

        let prompt = chat.last_user_message();
        assert!(prompt.contains("STUDENT PREFERRED STYLE: Analogy-first"));
        assert!(prompt.contains("QUESTION: What does chlorophyll do?"));
        let best = prompt.find("Plants use chlorophyll").unwrap();
        let other = prompt.find("The ocean is salty.").unwrap();
        assert!(best < other);
    }

    #[tokio::test]
    async fn test_ask_default_style() {
        let chat = Arc::new(RecordingChat::answering("ok"));
        let tutor = tutor_with(Arc::new(KeywordEmbedder), chat.clone());
        tutor
            .ask(AskRequest {
                question: Some("q".to_string()),
                style: Some(String::new()),
            })
            .await
            .unwrap();
        assert!(chat
            .last_user_message()
            .contains("STUDENT PREFERRED STYLE: Concise"));
    }

    #[tokio::test]
    async fn test_ask_empty_question_rejected() {
        let chat = Arc::new(RecordingChat::answering("ok"));
        let tutor = tutor_with(Arc::new(KeywordEmbedder), chat.clone());
        let err = tutor.ask(ask_req("  ")).await.unwrap_err();
        assert_eq!(err.to_string(), "No question provided.");
        assert!(chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_embedding_failure_is_error_result() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert(NewDocument {
                title: "notes".to_string(),
                text: "Chlorophyll is green.".to_string(),
                chunks: vec!["Chlorophyll is green.".to_string()],
                embeddings: vec![vec![1.0, 0.0, 0.1]],
            })
            .await
            .unwrap();
        let chat = Arc::new(RecordingChat::answering("unused"));
        let tutor = Tutor::new(
            store,
            Arc::new(BrokenEmbedder),
            chat.clone(),
            TutorSettings::from_config(&Config::default()),
        );

        let err = tutor.ask(ask_req("What is chlorophyll?")).await.unwrap_err();
        assert!(matches!(
            err,
            TutorError::Embedding(EmbeddingError::Api { status: 503, .. })
        ));
        assert!(!err.is_validation());
        assert!(chat.seen.lock().unwrap().is_empty());
        assert_eq!(tutor.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_document_lookup() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::answering("")));
        tutor.ingest(ingest_req("The ocean is salty.")).await.unwrap();

        let doc = tutor.document(0).await.unwrap();
        assert_eq!(doc.chunks, vec!["The ocean is salty."]);
        assert_eq!(doc.text, "The ocean is salty.");

        let err = tutor.document(3).await.unwrap_err();
        assert!(matches!(err, TutorError::DocumentNotFound(3)));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_ask_chat_failure_is_error_result() {
        let tutor = tutor_with(Arc::new(KeywordEmbedder), Arc::new(RecordingChat::failing(401)));
        let err = tutor.ask(ask_req("anything")).await.unwrap_err();
        assert!(matches!(err, TutorError::Chat(ChatError::Api { status: 401, .. })));
        assert!(err.to_string().contains("denied"));
    }
}
