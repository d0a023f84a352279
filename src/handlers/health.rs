//! Health endpoint.
//!
//! `GET /health` is never version gated, so load balancers and probes do not
//! need to send a version header.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "version_header": "Version",
///   "gated_routes": 4,
///   "uptime_seconds": 42,
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        version_header: state.gate.header_name().to_string(),
        gated_routes: state.routes.len(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
