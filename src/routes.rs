//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Sets/propagates X-Request-Id
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Version Gate    │ ← 400 if version unsupported (gated routes only)
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/health` - Health check (never gated)
//! - every path in the version table - demo echo handler behind the gate

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{any, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};

use crate::error::{AppError, AppResult};
use crate::handlers;
use crate::middleware::VersionGateLayer;
use crate::state::AppState;
use crate::version::{RouteVersions, VersionConstraint};

/// Paths served by the application itself, which the version table may not claim.
const RESERVED_PATHS: [&str; 1] = ["/health"];

/// Route table used when no rules file is configured.
///
/// | Path                   | Header   | Range      |
/// |------------------------|----------|------------|
/// | `/required/unbounded`  | required | any        |
/// | `/required/v2-v3`      | required | 2 ..= 3    |
/// | `/optional/v1.2-v2`    | optional | 1.2 ..= 2  |
/// | `/optional/v2-v3`      | optional | 2 ..= 3    |
///
/// # Errors
///
/// Never fails in practice; returns the builder's result for uniformity.
pub fn demo_routes() -> AppResult<RouteVersions> {
    RouteVersions::builder()
        .route("/required/unbounded", VersionConstraint::default())
        .route(
            "/required/v2-v3",
            VersionConstraint::builder().min(2.0).max(3.0).build(),
        )
        .route(
            "/optional/v1.2-v2",
            VersionConstraint::builder().optional().min(1.2).max(2.0).build(),
        )
        .route(
            "/optional/v2-v3",
            VersionConstraint::builder().optional().min(2.0).max(3.0).build(),
        )
        .build()
}

/// Build the application router with all routes and middleware configured.
///
/// Every distinct path in `state.routes` is mounted with the demo echo
/// handler for all methods, behind the version gate.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if the version table claims a reserved path.
pub fn build_router(state: AppState) -> AppResult<Router> {
    let config = &state.config;

    // =========================================================================
    // Gated Routes
    // =========================================================================
    let mut gated = Router::new();
    for path in state.routes.paths() {
        if RESERVED_PATHS.contains(&path) {
            return Err(AppError::ConfigError(format!(
                "Version rules may not claim reserved path {path}"
            )));
        }
        gated = gated.route(path, any(handlers::echo));
    }

    for entry in state.routes.iter() {
        info!(
            path = %entry.path,
            method = entry.method.as_ref().map_or("*", |m| m.as_str()),
            header_required = entry.constraint.header_required(),
            min_version = ?entry.constraint.min_version(),
            max_version = ?entry.constraint.max_version(),
            "Version rule registered"
        );
    }

    // axum rejects a route layer on a router without routes
    if state.routes.is_empty() {
        warn!("Version table is empty, no routes are gated");
    } else {
        let gate_layer = VersionGateLayer::new(state.gate.clone(), state.routes.clone());
        info!(
            header = %state.gate.header_name(),
            gated_routes = gate_layer.gated_routes(),
            "Version gate enabled"
        );
        gated = gated.route_layer(gate_layer);
    }

    // Added after the route layer so they are never gated
    let mut router = gated
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found);

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. CORS
    router = router.layer(build_cors_layer(&config.cors_allowed_origins));

    // 2. Tracing, with the request ID set by the outer layers
    router = router.layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        )
    }));

    // 3. Request ID: generate if missing, echo on the response
    router = router.layer(PropagateRequestIdLayer::x_request_id());
    router = router.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// # Security Note
///
/// Using `*` (any origin) is convenient for development but should be
/// avoided in production. Specify explicit origins instead.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    let layer = if allow_any {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer.allow_methods(Any).allow_headers(Any)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    fn app() -> Router {
        build_router(AppState::new(Config::default()).unwrap()).unwrap()
    }

    fn get_request(uri: &str, version: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(v) = version {
            builder = builder.header("Version", v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_demo_routes() {
        let routes = demo_routes().unwrap();
        assert_eq!(routes.len(), 4);
    }

    #[test]
    fn test_reserved_path_rejected() {
        let routes = RouteVersions::builder()
            .route("/health", VersionConstraint::default())
            .build()
            .unwrap();
        let state = AppState::with_routes(Config::default(), routes).unwrap();

        let err = build_router(state).unwrap_err();
        assert!(err.to_string().contains("reserved path /health"));
    }

    fn state_from_rules(name: &str, json: &str) -> AppResult<AppState> {
        let path = std::env::temp_dir().join(format!(
            "api_version_gate_routes_{}_{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, json).unwrap();
        let config = Config {
            version_rules_path: Some(path.clone()),
            ..Config::default()
        };
        let state = AppState::new(config);
        std::fs::remove_file(&path).ok();
        state
    }

    #[test]
    fn test_unmountable_rules_fail_before_routing() {
        let err = state_from_rules("colon", r#"{"routes":[{"path":"/users/:id"}]}"#)
            .err()
            .expect("old capture syntax should be refused");
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = state_from_rules(
            "conflict",
            r#"{"routes":[{"path":"/a/{id}"},{"path":"/a/{name}"}]}"#,
        )
        .err()
        .expect("conflicting capture names should be refused");
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_parameterised_rules_are_mounted() {
        let state = state_from_rules(
            "params",
            r#"{"routes":[
                {"path":"/a/{id}","minVersion":2},
                {"path":"/a/{id}/items/{item}"},
                {"path":"/a/static","headerRequired":false},
                {"path":"/files/{*rest}"}
            ]}"#,
        )
        .unwrap();
        let app = build_router(state).unwrap();

        let response = app
            .clone()
            .oneshot(get_request("/a/7", Some("1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(get_request("/a/static", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/files/x/y.txt", Some("3")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_version_table() {
        let state = AppState::with_routes(Config::default(), RouteVersions::default()).unwrap();
        let response = build_router(state)
            .unwrap()
            .oneshot(get_request("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_is_not_gated() {
        let response = app().oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let response = app().oneshot(get_request("/health", None)).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app().oneshot(get_request("/nope", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_gated_route() {
        let response = app()
            .oneshot(get_request("/required/v2-v3", Some("2")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(get_request("/required/v2-v3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_build_cors_layer_specific() {
        let origins = vec!["https://example.com".to_string()];
        let _layer = build_cors_layer(&origins);
    }
}
