use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service health status
    pub status: String,
    /// Service version
    pub version: String,
    /// Header clients use to request an API version
    pub version_header: String,
    /// Number of gated route entries
    pub gated_routes: usize,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}

/// Response of the demo echo handler for gated routes.
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    /// Matched route pattern
    pub route: String,
    /// HTTP method of the request
    pub method: String,
    /// Raw version header value, if the client sent one
    pub requested_version: Option<String>,
}
