use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::version::RejectionPayload;

/// Application-wide error types with appropriate HTTP status codes.
///
/// `VersionNotSupported` is the only error the version gate produces. It
/// covers a missing required header, an unparseable header, and a version
/// outside the route's range; the response body is the same in all three
/// cases.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API version not supported (header '{}')", .0.version_header_name)]
    VersionNotSupported(RejectionPayload),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error response body for non-version errors.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // The payload itself is the body, so clients can read the accepted range
            AppError::VersionNotSupported(payload) => {
                tracing::debug!(
                    header = %payload.version_header_name,
                    min_version = %payload.min_version,
                    max_version = %payload.max_version,
                    "Rejecting request with unsupported API version"
                );
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),

            // Internal errors - log details, never expose them to clients
            err @ (AppError::Internal(_) | AppError::ConfigError(_)) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred. Please contact support if the issue persists."
                        .to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::version::{VersionConstraint, VersionGate};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_version_not_supported_response() {
        let payload = VersionGate::default().rejection(&VersionConstraint::default());
        let response = AppError::VersionNotSupported(payload).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "versionHeaderName": "Version",
                "headerRequired": true,
                "minVersion": "no minimum version",
                "maxVersion": "no maximum version",
            })
        );
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AppError::NotFound("No route for /nope".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "No route for /nope");
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let response = AppError::Internal("secret detail".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn test_version_not_supported_display() {
        let payload = VersionGate::new("X-Api-Version")
            .unwrap()
            .rejection(&VersionConstraint::default());
        assert_eq!(
            AppError::VersionNotSupported(payload).to_string(),
            "API version not supported (header 'X-Api-Version')"
        );
    }
}
