//! Health check handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Configured storage backends
    pub backends: Vec<String>,
}

/// Liveness probe; the process is up and both backends are wired.
///
/// Providers are not contacted: they are only reached on upload requests.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backends = state
        .coordinator
        .backend_kinds()
        .iter()
        .map(ToString::to_string)
        .collect();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            backends,
        }),
    )
}
