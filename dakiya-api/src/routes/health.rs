//! Health check endpoints
//!
//! - /health/ping - Simple liveness check
//! - /health/ready - Catalog snapshot readiness
//!
//! No authentication required for health endpoints.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/ready - Readiness check. Degraded (but still serving) while
/// the engine runs on the built-in fallback catalog.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.engine.catalog();
    let (status, message) = if catalog.is_fallback() {
        (
            HealthStatus::Degraded,
            Some("running on built-in fallback catalog".to_string()),
        )
    } else {
        (HealthStatus::Healthy, None)
    };

    let response = HealthResponse {
        status,
        message,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Create the health router (no auth required).
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/ready", get(readiness))
        .with_state(state)
}
