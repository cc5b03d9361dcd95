//! Status Routes
//!
//! Health checks.
//!
//! Routes:
//! - GET /health - Health check (database reachable)
//! - GET /health/live - Liveness check (server responding)

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check.
///
/// GET /health
///
/// Returns 503 when the database does not answer.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (code, status) = match crate::db::health_check(&state.db).await {
        Ok(()) => (StatusCode::OK, HealthStatus::Healthy),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").into(),
            timestamp: Utc::now(),
        }),
    )
}

/// Liveness check.
///
/// GET /health/live
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
