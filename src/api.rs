//! HTTP surface for Folioscan.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /documents` – Upload a scan bundle with title metadata; creates the
//!   document record and stores the source artifact.
//! - `POST /documents/:id/process` – Trigger a pipeline run for the document.
//!   Dispatch is fire-and-forget; completion is observed through the document
//!   record, never through this call.
//! - `GET /documents/:id` – Document status, counters, and progress.
//! - `GET /documents/:id/pages` – Per-page processing states.
//! - `GET /documents/:id/outline` – The structural index in tree form.
//! - `POST /search` – Hybrid semantic + lexical search over the corpus.
//! - `GET /metrics` – Pipeline and search counters.

use crate::assets::AssetStore;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::model::{Document, PageStatus, SearchResult};
use crate::outline::{OutlineNode, build_outline_tree};
use crate::pipeline::PipelineService;
use crate::search::{HybridSearchEngine, SearchError, SearchOptions};
use crate::store::{DocumentStore, StoreError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handles behind every route.
pub struct AppState {
    /// Document store backing reads and the pipeline.
    pub store: Arc<dyn DocumentStore>,
    /// Artifact store for uploaded sources.
    pub assets: Arc<dyn AssetStore>,
    /// Pipeline coordinator for processing runs.
    pub pipeline: Arc<PipelineService>,
    /// Hybrid search engine.
    pub search: Arc<HybridSearchEngine>,
    /// Activity counters.
    pub metrics: Arc<PipelineMetrics>,
}

/// Build the HTTP router exposing the document and search API surface.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/documents", post(create_document))
        .route("/documents/:id/process", post(process_document))
        .route("/documents/:id", get(get_document))
        .route("/documents/:id/pages", get(list_pages))
        .route("/documents/:id/outline", get(get_outline))
        .route("/search", post(search))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

/// Query parameters accepted by `POST /documents`.
#[derive(Deserialize)]
struct CreateDocumentParams {
    /// Document title, also searched by the lexical path.
    title: String,
    /// Free-form category label.
    #[serde(default)]
    category: Option<String>,
    /// Publication year, when known.
    #[serde(default)]
    year: Option<i32>,
    /// Descriptive metadata.
    #[serde(default)]
    description: Option<String>,
}

/// Response body for `POST /documents`.
#[derive(Serialize)]
struct CreateDocumentResponse {
    document_id: String,
}

/// Create a document record and persist the uploaded source artifact.
async fn create_document(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreateDocumentParams>,
    body: Bytes,
) -> Result<Json<CreateDocumentResponse>, AppError> {
    let source_ref = state
        .assets
        .store(body.to_vec())
        .await
        .map_err(|error| AppError::Internal(error.to_string()))?;

    let mut document = Document::new(
        params.title,
        params.category.unwrap_or_default(),
        params.year,
        params.description,
    );
    document.source_asset = Some(source_ref);
    let document_id = document.id.clone();
    state.store.insert_document(document).await?;

    tracing::info!(document_id, "Document created");
    Ok(Json(CreateDocumentResponse { document_id }))
}

/// Response body for `POST /documents/:id/process`.
#[derive(Serialize)]
struct ProcessResponse {
    status: &'static str,
}

/// Trigger a processing run; returns before any page completes.
async fn process_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    // Reject unknown ids before dispatch so the caller gets a 404, not a
    // silently failing background run.
    state.store.get_document(&id).await?;
    tokio::spawn(state.pipeline.clone().run(id));
    Ok((StatusCode::ACCEPTED, Json(ProcessResponse { status: "accepted" })))
}

/// Fetch a document's status and counters.
async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(state.store.get_document(&id).await?))
}

/// Per-page state returned by `GET /documents/:id/pages`.
#[derive(Serialize)]
struct PageSummary {
    page_number: u32,
    status: PageStatus,
    text_length: usize,
}

/// Response body for `GET /documents/:id/pages`.
#[derive(Serialize)]
struct PagesResponse {
    pages: Vec<PageSummary>,
}

/// List the processing state of every page of a document.
async fn list_pages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PagesResponse>, AppError> {
    state.store.get_document(&id).await?;
    let pages = state
        .store
        .list_pages(&id)
        .await?
        .into_iter()
        .map(|page| PageSummary {
            page_number: page.page_number,
            status: page.status,
            text_length: page.text.len(),
        })
        .collect();
    Ok(Json(PagesResponse { pages }))
}

/// Response body for `GET /documents/:id/outline`.
#[derive(Serialize)]
struct OutlineResponse {
    outline: Vec<OutlineNode>,
}

/// Return the document's structural index as a nested forest.
async fn get_outline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OutlineResponse>, AppError> {
    state.store.get_document(&id).await?;
    let entries = state.store.list_index_entries(&id).await?;
    Ok(Json(OutlineResponse {
        outline: build_outline_tree(&entries),
    }))
}

/// Request body for `POST /search`.
#[derive(Deserialize)]
struct SearchRequest {
    /// Query text.
    query: String,
    /// Match with exact case.
    #[serde(default)]
    case_sensitive: bool,
    /// Match only at word boundaries.
    #[serde(default)]
    whole_word: bool,
    /// Optional result limit override.
    #[serde(default)]
    limit: Option<usize>,
}

/// Response body for `POST /search`.
#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// Execute a hybrid search.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let options = SearchOptions {
        case_sensitive: request.case_sensitive,
        whole_word: request.whole_word,
        limit: request.limit,
    };
    let results = state.search.search(&request.query, &options).await?;
    state.metrics.record_search();
    Ok(Json(SearchResponse { results }))
}

/// Return the current pipeline counters.
async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DocumentMissing(_) | StoreError::PageMissing(_) => {
                Self::NotFound(error.to_string())
            }
        }
    }
}

impl From<SearchError> for AppError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::Filter(_) => Self::BadRequest(error.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
