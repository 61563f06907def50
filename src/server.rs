//! HTTP server for the fact and knowledge endpoints
//!
//! The fact and retrieve paths never surface internal faults as
//! errors: degraded behavior is a less-optimal fact or an empty
//! context list. Ingestion is the exception, since callers must know
//! when content was not indexed.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::facts::{FactEngine, SessionStore};
use crate::retrieval::KnowledgeRetriever;
use crate::types::ChunkSource;

/// Header carrying the client's opaque session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared application state
pub struct AppState {
    pub engine: FactEngine,
    pub retriever: KnowledgeRetriever,
    pub sessions: Arc<dyn SessionStore>,
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/facts/next", get(next_fact_handler))
        .route("/facts/stats", get(fact_stats_handler))
        .route("/knowledge/ingest", post(ingest_handler))
        .route("/knowledge/retrieve", post(retrieve_handler))
        .route("/knowledge/:id", delete(deactivate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on the given port until shutdown
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "corpus_size": state.engine.store().len(),
    }))
}

/// GET /facts/next
///
/// A missing, unknown, or expired session id simply starts a fresh
/// session; the resolved id is echoed back in the response header so
/// clients can persist it.
async fn next_fact_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut session = state.sessions.get(&session_id);

    let Some(response) = state.engine.next_fact(&mut session).await else {
        // Only reachable with an empty corpus, which is a deployment
        // problem rather than a request fault
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "fact corpus is empty"})),
        )
            .into_response();
    };

    state.sessions.put(&session_id, session);

    let mut out = (StatusCode::OK, Json(response)).into_response();
    if let Ok(value) = session_id.parse() {
        out.headers_mut().insert(SESSION_HEADER, value);
    }
    out
}

async fn fact_stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let balancer = state.engine.balancer();
    Json(json!({
        "corpus_size": state.engine.store().len(),
        "total_shown": balancer.total(),
        "category_distribution": state.engine.distribution_by_name(),
    }))
}

#[derive(Debug, Deserialize)]
struct IngestRequest {
    user_id: String,
    #[serde(default)]
    source: ChunkSource,
    content: String,
    #[serde(default = "default_importance")]
    importance: f32,
}

fn default_importance() -> f32 {
    0.5
}

/// POST /knowledge/ingest
async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Response {
    match state
        .retriever
        .ingest(&req.user_id, req.source, &req.content, req.importance)
        .await
    {
        Ok(chunk) => (
            StatusCode::CREATED,
            Json(json!({
                "id": chunk.id,
                "user_id": chunk.user_id,
                "source": chunk.source,
                "created_at": chunk.created_at,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(user_id = %req.user_id, error = %e, "ingest failed");
            let status = if matches!(e, crate::LoreError::InvalidInput(_)) {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RetrieveRequest {
    user_id: String,
    query: String,
    top_k: Option<usize>,
}

/// POST /knowledge/retrieve
///
/// Always 200; degradation shows up as an empty chunk list.
async fn retrieve_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveRequest>,
) -> impl IntoResponse {
    let chunks = state
        .retriever
        .retrieve(&req.user_id, &req.query, req.top_k)
        .await;

    Json(json!({
        "count": chunks.len(),
        "chunks": chunks,
    }))
}

/// DELETE /knowledge/:id - logical removal
async fn deactivate_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.retriever.deactivate(&id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "chunk not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
