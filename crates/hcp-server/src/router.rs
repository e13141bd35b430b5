//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ui;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check));

    let gate = Router::new()
        .route("/", get(ui::login_page).post(ui::login_submit))
        .with_state(state);

    Router::new()
        .merge(health)
        .merge(gate)
        .layer(TraceLayer::new_for_http())
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0.status, "healthy");
    }
}
