//! Version gate: turns a constraint and a header value into a decision.
//!
//! # Decision Order
//!
//! The first matching rule wins:
//!
//! 1. Header absent or empty, and required → reject
//! 2. Header absent or empty, and optional → accept (bounds are not checked)
//! 3. Header present but not a finite number → reject
//! 4. Header within both inclusive bounds → accept, otherwise reject
//!
//! All rejections carry the same [`RejectionPayload`]. Callers cannot tell
//! which rule fired beyond what the echoed constraint implies.
//!
//! # Concurrency
//!
//! [`VersionGate::evaluate`] only reads its arguments. It performs no I/O and
//! no logging, so one gate can serve every request concurrently.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};

use super::constraint::VersionConstraint;
use crate::error::{AppError, AppResult};

/// Header read when no other name is configured.
pub const DEFAULT_VERSION_HEADER: &str = "Version";

/// Rendered in place of an unbounded minimum.
pub const NO_MINIMUM_VERSION: &str = "no minimum version";

/// Rendered in place of an unbounded maximum.
pub const NO_MAXIMUM_VERSION: &str = "no maximum version";

/// Policy deciding whether a header value satisfies a constraint.
///
/// Implementations must be pure: the same inputs always give the same answer.
pub trait VersionMatcher: Send + Sync + fmt::Debug {
    /// Returns true if the request may proceed.
    ///
    /// `header` is the raw value of the version header, or `None` when the
    /// request did not carry one.
    fn supports(&self, constraint: &VersionConstraint, header: Option<&str>) -> bool;
}

/// Numeric matcher with inclusive bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVersionMatcher;

impl VersionMatcher for DefaultVersionMatcher {
    fn supports(&self, constraint: &VersionConstraint, header: Option<&str>) -> bool {
        match header.filter(|value| !value.is_empty()) {
            None => !constraint.header_required(),
            Some(raw) => parse_version(raw).is_some_and(|version| constraint.contains(version)),
        }
    }
}

/// Parse a header value as a version number.
///
/// Surrounding whitespace is ignored, and a leading `+` or a bare fraction
/// such as `.5` is accepted. Stricter than lenient float parsers that take
/// `NaN`, `Infinity`, values overflowing to infinity (`1e39`) or type
/// suffixes (`2f`, `2d`): none of those is a version, so such headers are
/// rejected even on an optional, unbounded route.
pub fn parse_version(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|version| version.is_finite())
}

/// Body of a `400 Bad Request` describing the versions a route accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionPayload {
    /// Name of the header clients must send.
    pub version_header_name: String,
    /// Echo of the route's `header_required` flag.
    pub header_required: bool,
    /// Lower bound as text, or [`NO_MINIMUM_VERSION`].
    pub min_version: String,
    /// Upper bound as text, or [`NO_MAXIMUM_VERSION`].
    pub max_version: String,
}

impl RejectionPayload {
    /// Describe `constraint` for a client using `header_name`.
    pub fn new(header_name: &str, constraint: &VersionConstraint) -> Self {
        Self {
            version_header_name: header_name.to_string(),
            header_required: constraint.header_required(),
            min_version: render_bound(constraint.min_version(), NO_MINIMUM_VERSION),
            max_version: render_bound(constraint.max_version(), NO_MAXIMUM_VERSION),
        }
    }
}

fn render_bound(bound: Option<f32>, unbounded: &str) -> String {
    match bound {
        Some(version) => version.to_string(),
        None => unbounded.to_string(),
    }
}

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    /// The request proceeds unchanged.
    Accept,
    /// The request must be answered with a client error.
    Reject(RejectionPayload),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    pub fn is_reject(&self) -> bool {
        !self.is_accept()
    }

    /// The rejection payload, if any.
    pub fn rejection(&self) -> Option<&RejectionPayload> {
        match self {
            Decision::Accept => None,
            Decision::Reject(payload) => Some(payload),
        }
    }

    /// Convert into a result so handlers can use `?`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::VersionNotSupported` for a rejection.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Accept => Ok(()),
            Decision::Reject(payload) => Err(AppError::VersionNotSupported(payload)),
        }
    }
}

/// Decides whether requests satisfy a route's [`VersionConstraint`].
///
/// The header name is process-wide. It is echoed verbatim in rejections and
/// matched case-insensitively against request headers.
///
/// # Example
///
/// ```rust
/// use api_version_gate::{Decision, VersionConstraint, VersionGate};
///
/// let gate = VersionGate::default();
/// let constraint = VersionConstraint::builder().min(2.0).max(3.0).build();
///
/// assert_eq!(gate.evaluate(&constraint, Some("2.5")), Decision::Accept);
/// assert!(gate.evaluate(&constraint, Some("4")).is_reject());
/// ```
#[derive(Debug, Clone)]
pub struct VersionGate<M = DefaultVersionMatcher> {
    header_name: HeaderName,
    display_name: Arc<str>,
    matcher: M,
}

impl VersionGate<DefaultVersionMatcher> {
    /// Create a gate reading `header_name` with the default matcher.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if `header_name` is not a valid HTTP
    /// header name.
    pub fn new(header_name: &str) -> AppResult<Self> {
        Self::with_matcher(header_name, DefaultVersionMatcher)
    }
}

impl Default for VersionGate<DefaultVersionMatcher> {
    fn default() -> Self {
        Self {
            header_name: HeaderName::from_static("version"),
            display_name: Arc::from(DEFAULT_VERSION_HEADER),
            matcher: DefaultVersionMatcher,
        }
    }
}

impl<M: VersionMatcher> VersionGate<M> {
    /// Create a gate with a custom matching policy.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if `header_name` is not a valid HTTP
    /// header name.
    pub fn with_matcher(header_name: &str, matcher: M) -> AppResult<Self> {
        let parsed = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
            AppError::ConfigError(format!("Invalid version header name '{header_name}': {e}"))
        })?;

        Ok(Self {
            header_name: parsed,
            display_name: Arc::from(header_name),
            matcher,
        })
    }

    /// Header name as configured (original casing).
    pub fn header_name(&self) -> &str {
        &self.display_name
    }

    /// Decide whether a request with `header` may reach a route with `constraint`.
    pub fn evaluate(&self, constraint: &VersionConstraint, header: Option<&str>) -> Decision {
        if self.matcher.supports(constraint, header) {
            Decision::Accept
        } else {
            Decision::Reject(self.rejection(constraint))
        }
    }

    /// Read the version header from `headers` and evaluate it.
    ///
    /// Only the first value counts when the header repeats. Values that are
    /// not valid UTF-8 are treated as present but unparseable.
    pub fn evaluate_headers(&self, constraint: &VersionConstraint, headers: &HeaderMap) -> Decision {
        let raw = self.header_value(headers);
        self.evaluate(constraint, raw.as_deref())
    }

    /// The version header of a request, if sent.
    pub fn header_value<'a>(&self, headers: &'a HeaderMap) -> Option<Cow<'a, str>> {
        headers
            .get(&self.header_name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
    }

    /// Build the payload describing `constraint` to clients.
    pub fn rejection(&self, constraint: &VersionConstraint) -> RejectionPayload {
        RejectionPayload::new(&self.display_name, constraint)
    }
}
