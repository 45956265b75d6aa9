//! HTTP server for the tutoring UI and API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Single-page UI |
//! | `GET`  | `/health` | Health check (returns version and document count) |
//! | `GET`  | `/documents` | Summaries of ingested documents |
//! | `GET`  | `/documents/{id}` | One document with its chunks |
//! | `POST` | `/ingest` | Chunk, embed, and store a document |
//! | `POST` | `/chat` | Answer a question from stored material |
//! | `POST` | `/ask` | Alias of `/chat` |
//!
//! # Error Contract
//!
//! Every failure uses the same body:
//!
//! ```json
//! { "ok": false, "error": "No text provided." }
//! ```
//!
//! Status codes: `400` for validation and malformed JSON, `413` for an
//! oversized body, `415` when the body is not `application/json`, `404` for
//! an unknown document id, `500` for provider failures, `507` when the store
//! is full under the `reject` policy.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the UI can also be
//! served from elsewhere during development.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use tutorbot_core::store::StoreError;

use crate::config::Config;
use crate::models::{
    AskRequest, AskResponse, DocumentListResponse, DocumentResponse, ErrorResponse, IngestRequest,
    IngestResponse,
};
use crate::tutor::{Tutor, TutorError};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    tutor: Arc<Tutor>,
}

/// Build the router without binding a socket.
pub fn router(tutor: Arc<Tutor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/documents", get(handle_documents))
        .route("/documents/{id}", get(handle_document))
        .route("/ingest", post(handle_ingest))
        .route("/chat", post(handle_ask))
        .route("/ask", post(handle_ask))
        .layer(cors)
        .with_state(AppState { tutor })
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until the process is terminated. Returns an error if binding fails.
pub async fn run_server(config: &Config, tutor: Arc<Tutor>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(tutor);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("TutorBot listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<TutorError> for AppError {
    fn from(err: TutorError) -> Self {
        let status = match &err {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            TutorError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            TutorError::Store(StoreError::Full { .. }) => StatusCode::INSUFFICIENT_STORAGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "Request failed");
        }
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    version: String,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.tutor.document_count().await?,
    }))
}

// ============ GET /documents ============

async fn handle_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    Ok(Json(DocumentListResponse {
        ok: true,
        documents: state.tutor.documents().await?,
    }))
}

// ============ GET /documents/{id} ============

async fn handle_document(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DocumentResponse>, AppError> {
    let Path(id) = id?;
    Ok(Json(state.tutor.document(id).await?))
}

// ============ POST /ingest ============

async fn handle_ingest(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.tutor.ingest(req).await?))
}

// ============ POST /chat, /ask ============

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.tutor.ask(req).await?))
}
