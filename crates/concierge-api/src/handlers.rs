//! HTTP request handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use concierge_chat::InterpreterStats;
use concierge_nlu::MemoryLevel;

use crate::envelope::Outbound;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub memory_level: MemoryLevel,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        memory_level: state.interpreter.memory_level(),
    })
}

// =============================================================================
// Interpreter
// =============================================================================

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Json<InterpreterStats> {
    Json(state.interpreter.stats())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// POST /cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    state.interpreter.reset();
    Ok(Json(ClearResponse { cleared: true }))
}

// =============================================================================
// Reservations
// =============================================================================

/// GET /snapshot: the same state a new channel connection receives first.
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<Outbound>, ApiError> {
    Ok(Json(state.dispatcher.snapshot().await?))
}
