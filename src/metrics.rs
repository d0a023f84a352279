//! Prometheus metrics for version gate observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `api_version_gate_decisions_total` - Gate outcomes (labels: route, outcome).
//!   `route` is a route pattern, or `unmatched` when the router matched none.
//!
//! ## Histograms
//! - `api_version_gate_requested_version` - Versions of accepted requests (label: route)
//!
//! # Usage
//!
//! ```rust,ignore
//! use api_version_gate::metrics::{init_metrics, record_decision, Outcome};
//!
//! init_metrics(addr)?;
//! record_decision("/widgets", Outcome::Rejected);
//! ```
//!
//! Recording is a no-op until an exporter is installed, so tests and
//! embedders that skip `init_metrics` are unaffected.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

use crate::error::{AppError, AppResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const DECISIONS_TOTAL: &str = "api_version_gate_decisions_total";
    pub const REQUESTED_VERSION: &str = "api_version_gate_requested_version";
}

/// Gate outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
    /// Route has no registered constraint
    Ungated,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
            Outcome::Ungated => "ungated",
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns `AppError::Internal` if the exporter cannot be installed (for
/// example, the port is taken or an exporter is already installed).
pub fn init_metrics(metrics_addr: SocketAddr) -> AppResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| AppError::Internal(format!("Failed to install Prometheus exporter: {e}")))?;

    describe_counter!(
        names::DECISIONS_TOTAL,
        "Version gate decisions by route and outcome"
    );
    describe_histogram!(
        names::REQUESTED_VERSION,
        "API versions requested by accepted clients"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record one gate decision.
pub fn record_decision(route: &str, outcome: Outcome) {
    counter!(names::DECISIONS_TOTAL, "route" => route.to_string(), "outcome" => outcome.as_str())
        .increment(1);
}

/// Record the version an accepted request asked for.
pub fn record_requested_version(route: &str, version: f32) {
    histogram!(names::REQUESTED_VERSION, "route" => route.to_string()).record(f64::from(version));
}
