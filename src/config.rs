//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Version Gating
//!
//! - `VERSION_HEADER_NAME`: Header carrying the client's API version (default: `Version`)
//! - `VERSION_RULES_PATH`: JSON file mapping routes to version constraints
//!   (default: unset, the built-in demo routes are used)
//!
//! # Observability
//!
//! - `RUST_LOG`: Log filter (default: `info`)
//! - `LOG_FORMAT`: `text` or `json` (default: `text`)
//! - `METRICS_PORT`: Prometheus listener port (default: 9090, 0 = disabled)

use std::env;
use std::path::PathBuf;

use axum::http::HeaderName;

use crate::error::{AppError, AppResult};
use crate::version::DEFAULT_VERSION_HEADER;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line, for log shippers
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Version Gate Configuration
    // =========================================================================
    /// Header carrying the requested API version, shared by every route.
    /// Echoed verbatim in rejection bodies; matched case-insensitively.
    pub version_header_name: String,

    /// Optional JSON rules file (see `RouteVersions::from_file`)
    pub version_rules_path: Option<PathBuf>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any configuration value is invalid
    /// (e.g., non-numeric PORT value, malformed header name).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            cors_allowed_origins: Self::parse_cors_origins(),

            // Version gate
            version_header_name: env::var("VERSION_HEADER_NAME")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_VERSION_HEADER.to_string()),
            version_rules_path: env::var("VERSION_RULES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::Text)?,
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if HeaderName::from_bytes(self.version_header_name.as_bytes()).is_err() {
            return Err(AppError::ConfigError(format!(
                "VERSION_HEADER_NAME ('{}') is not a valid HTTP header name",
                self.version_header_name
            )));
        }

        if self.host.trim().is_empty() {
            return Err(AppError::ConfigError("HOST must not be empty".to_string()));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
            version_header_name: DEFAULT_VERSION_HEADER.to_string(),
            version_rules_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_port: 9090,
        }
    }
}
