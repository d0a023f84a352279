//! # API Version Gate
//!
//! Header-based API version gating for Axum services:
//!
//! - **Per-route constraints**: required or optional version header, inclusive
//!   minimum and maximum, either side unbounded
//! - **Pure decisions**: [`VersionGate::evaluate`] returns a [`Decision`]
//!   instead of failing, so any transport can use it
//! - **Structured rejections**: `400 Bad Request` with a JSON body describing
//!   the accepted range
//! - **Explicit registration**: a [`RouteVersions`] table, built in code or
//!   loaded from a JSON rules file
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VersionGateLayer (route layer)                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RouteVersions lookup → VersionGate::evaluate → Decision    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers                                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use api_version_gate::middleware::VersionGateLayer;
//! use api_version_gate::{RouteVersions, VersionConstraint, VersionGate};
//! use axum::{Router, routing::get};
//!
//! # fn main() -> Result<(), api_version_gate::AppError> {
//! let routes = RouteVersions::builder()
//!     .route("/widgets", VersionConstraint::builder().min(2.0).max(3.0).build())
//!     .build()?;
//! let layer = VersionGateLayer::new(Arc::new(VersionGate::default()), Arc::new(routes));
//!
//! let app: Router = Router::new()
//!     .route("/widgets", get(|| async { "widgets" }))
//!     .route_layer(layer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```bash
//! VERSION_HEADER_NAME=X-Api-Version VERSION_RULES_PATH=rules.json cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;
pub mod version;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use version::{
    Decision, RejectionPayload, RouteVersions, VersionConstraint, VersionGate, VersionMatcher,
};
