//! API routes for copilotd
//!
//! Orchestration and ingestion block on collaborators, so both run on
//! tokio's blocking pool.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use copilot_shared::{
    AskRequest, CopilotError, ErrorBody, FinalResult, HealthResponse, IngestResponse,
    ReadyResponse,
};
use std::sync::Arc;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::policy;
use crate::server::AppState;

type AppStateArc = Arc<AppState>;

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            code: code.to_string(),
        }),
    )
}

/// Map core errors onto HTTP statuses
pub fn error_response(e: CopilotError) -> ApiError {
    let status = match &e {
        CopilotError::Retrieval(_) | CopilotError::Generation(_) => StatusCode::BAD_GATEWAY,
        CopilotError::PolicyBlocked(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody::from(&e)))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("Worker task failed: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "worker task failed")
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Ready when the generator answers and the knowledge base has content
async fn ready(State(state): State<AppStateArc>) -> Json<ReadyResponse> {
    let check = tokio::task::spawn_blocking(move || -> Result<(), String> {
        state.rag.generator().check_ready().map_err(|e| e.to_string())?;
        let stats = state.rag.stats().map_err(|e| e.to_string())?;
        if stats.chunks == 0 {
            return Err("knowledge base is empty, run /ingest".to_string());
        }
        Ok(())
    })
    .await;

    match check {
        Ok(Ok(())) => Json(ReadyResponse {
            ready: true,
            error: None,
        }),
        Ok(Err(e)) => Json(ReadyResponse {
            ready: false,
            error: Some(e),
        }),
        Err(e) => Json(ReadyResponse {
            ready: false,
            error: Some(e.to_string()),
        }),
    }
}

// ============================================================================
// Knowledge Routes
// ============================================================================

pub fn knowledge_routes() -> Router<AppStateArc> {
    Router::new().route("/ingest", post(ingest))
}

async fn ingest(State(state): State<AppStateArc>) -> Result<Json<IngestResponse>, ApiError> {
    let dir = state.data_dir.clone();
    let stats = tokio::task::spawn_blocking(move || state.rag.ingest_dir(&state.data_dir))
        .await
        .map_err(join_error)?
        .map_err(|e| {
            error!("Ingestion failed: {}", e);
            error_response(e)
        })?;

    if stats.documents == 0 {
        return Ok(Json(IngestResponse {
            message: format!("No documents found in {}", dir.display()),
            documents: 0,
            chunks: 0,
        }));
    }

    Ok(Json(IngestResponse {
        message: "Ingestion complete".to_string(),
        documents: stats.documents,
        chunks: stats.chunks,
    }))
}

// ============================================================================
// Ask Routes
// ============================================================================

pub fn ask_routes() -> Router<AppStateArc> {
    Router::new().route("/ask", post(ask))
}

async fn ask(
    State(state): State<AppStateArc>,
    Json(req): Json<AskRequest>,
) -> Result<Json<FinalResult>, ApiError> {
    let request_id = Uuid::new_v4();

    if state.block_sensitive {
        if let Err(e) = policy::screen(&req.question) {
            warn!(%request_id, "Refused question: {}", e);
            return Err(error_response(e));
        }
    }

    let span = info_span!("ask", %request_id);
    let result = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        info!(question_len = req.question.len(), "Answering question");
        state.orchestrator.run(&req.question)
    })
    .await
    .map_err(join_error)?;

    match result {
        Ok(answer) => Ok(Json(answer)),
        Err(e) => {
            error!(%request_id, "Orchestration failed: {}", e);
            Err(error_response(e))
        }
    }
}
