//! Version gate middleware.
//!
//! Looks up the matched route in [`RouteVersions`], runs the [`VersionGate`],
//! and either forwards the request or answers `400 Bad Request` with the
//! rejection payload as JSON.
//!
//! # Usage
//!
//! Apply with `Router::route_layer` so the matched route pattern is known:
//!
//! ```rust,ignore
//! let layer = VersionGateLayer::new(gate, routes);
//! let app = Router::new()
//!     .route("/widgets/{id}", get(get_widget))
//!     .route_layer(layer);
//! ```
//!
//! When applied with `Router::layer` instead, the raw request path is used
//! for lookup, so parameterised patterns will not match.
//!
//! # Behaviour
//!
//! | Route registered | Decision | Result                         |
//! |------------------|----------|--------------------------------|
//! | no               | -        | forwarded                      |
//! | yes              | accept   | forwarded                      |
//! | yes              | reject   | 400, inner service not called  |

use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::metrics::{Outcome, record_decision, record_requested_version};
use crate::version::{
    Decision, DefaultVersionMatcher, RouteVersions, VersionGate, VersionMatcher, parse_version,
};

/// Version gate layer for the Tower middleware stack.
pub struct VersionGateLayer<M = DefaultVersionMatcher> {
    gate: Arc<VersionGate<M>>,
    routes: Arc<RouteVersions>,
}

impl<M> VersionGateLayer<M> {
    /// Create a layer gating the routes in `routes` with `gate`.
    pub fn new(gate: Arc<VersionGate<M>>, routes: Arc<RouteVersions>) -> Self {
        Self { gate, routes }
    }

    /// Number of gated route entries.
    pub fn gated_routes(&self) -> usize {
        self.routes.len()
    }
}

impl<M> Clone for VersionGateLayer<M> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<S, M> Layer<S> for VersionGateLayer<M> {
    type Service = VersionGateService<S, M>;

    fn layer(&self, inner: S) -> Self::Service {
        VersionGateService {
            inner,
            gate: self.gate.clone(),
            routes: self.routes.clone(),
        }
    }
}

/// Version gate service wrapper.
pub struct VersionGateService<S, M = DefaultVersionMatcher> {
    inner: S,
    gate: Arc<VersionGate<M>>,
    routes: Arc<RouteVersions>,
}

impl<S: Clone, M> Clone for VersionGateService<S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: self.gate.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<S, M> Service<Request<Body>> for VersionGateService<S, M>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    M: VersionMatcher + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let matched = route_pattern(&req);
        let route = matched
            .clone()
            .unwrap_or_else(|| req.uri().path().to_string());
        let mut inner = self.inner.clone();

        let Some(constraint) = self.routes.lookup(req.method(), &route) else {
            record_decision(ungated_label(matched.as_deref()), Outcome::Ungated);
            return Box::pin(async move { inner.call(req).await });
        };

        match self.gate.evaluate_headers(constraint, req.headers()) {
            Decision::Accept => {
                let requested = self.gate.header_value(req.headers()).map(Cow::into_owned);
                debug!(
                    route = %route,
                    method = %req.method(),
                    requested_version = ?requested,
                    "API version accepted"
                );
                if let Some(version) = requested.as_deref().and_then(parse_version) {
                    record_requested_version(&route, version);
                }
                record_decision(&route, Outcome::Accepted);

                Box::pin(async move { inner.call(req).await })
            }
            Decision::Reject(payload) => {
                warn!(
                    route = %route,
                    method = %req.method(),
                    requested_version = ?self.gate.header_value(req.headers()),
                    header_required = payload.header_required,
                    min_version = %payload.min_version,
                    max_version = %payload.max_version,
                    "API version not supported"
                );
                record_decision(&route, Outcome::Rejected);

                Box::pin(async move { Ok(AppError::VersionNotSupported(payload).into_response()) })
            }
        }
    }
}

/// Metric label for requests that reached the layer without a matched route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Matched route pattern, if the router recorded one.
///
/// Without it (layer applied with `Router::layer`) the raw path is used for
/// lookup only.
fn route_pattern<B>(req: &Request<B>) -> Option<String> {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
}

/// Route label for an ungated request.
///
/// Raw paths are never used as labels, since they are unbounded.
fn ungated_label(matched: Option<&str>) -> &str {
    matched.unwrap_or(UNMATCHED_ROUTE)
}
