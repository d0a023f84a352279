//! Shared application state for Axum handlers.
//!
//! Everything here is built once at startup and read-only afterwards, so
//! handlers and the version gate share it through `Arc` without locking.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::routes::demo_routes;
use crate::version::{RouteVersions, VersionGate};

/// Shared application state for Axum handlers.
///
/// Cloned for each request; all fields are cheap `Arc` clones.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Gate configured with the process-wide version header
    pub gate: Arc<VersionGate>,
    /// Route → version constraint table
    pub routes: Arc<RouteVersions>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Loads the rules file named by `version_rules_path`, or the built-in
    /// demo routes when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the header name is invalid or the
    /// rules file cannot be loaded.
    pub fn new(config: Config) -> AppResult<Self> {
        let routes = match &config.version_rules_path {
            Some(path) => {
                info!(path = %path.display(), "Loading version rules");
                RouteVersions::from_file(path)?
            }
            None => {
                info!("No VERSION_RULES_PATH set, using built-in demo routes");
                demo_routes()?
            }
        };

        Self::with_routes(config, routes)
    }

    /// Build state with an explicit route table.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the configured header name is invalid.
    pub fn with_routes(config: Config, routes: RouteVersions) -> AppResult<Self> {
        let gate = VersionGate::new(&config.version_header_name)?;

        Ok(Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            routes: Arc::new(routes),
            started_at: Instant::now(),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
