// src/api.rs
use shuttle_axum::axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::pipeline::{PipelineStatus, SharedStatus};

#[derive(Clone)]
pub struct AppState {
    status: SharedStatus,
}

impl AppState {
    pub fn new(status: SharedStatus) -> Self {
        Self { status }
    }
}

/// `/health` and `/status`. `/metrics` is merged in by the binary.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Result<Json<PipelineStatus>, StatusCode> {
    let snapshot = state
        .status
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();
    Ok(Json(snapshot))
}
