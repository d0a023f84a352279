//! Route registry mapping route patterns to version constraints.
//!
//! Populated once at startup, either in code through
//! [`RouteVersions::builder`] or from a JSON rules file:
//!
//! ```json
//! {
//!   "routes": [
//!     { "path": "/required/noMinOrMax" },
//!     { "path": "/widgets/{id}", "method": "GET", "minVersion": 2, "maxVersion": 3 },
//!     { "path": "/reports", "headerRequired": false, "minVersion": 1.2 }
//!   ]
//! }
//! ```
//!
//! # Lookup
//!
//! Paths are axum route patterns, compared exactly against the matched
//! pattern of a request. An entry bound to a method wins over an entry for
//! the same path without one. Routes absent from the registry are not gated.

use std::collections::HashMap;
use std::path::Path;

use axum::http::Method;
use serde::Deserialize;

use super::constraint::{VersionConstraint, default_true};
use crate::error::{AppError, AppResult};

/// Methods accepted in rules files.
const KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// One registered route and its constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteVersion {
    /// Route pattern, e.g. `/widgets/{id}`
    pub path: String,
    /// Method the constraint applies to (`None` = every method)
    pub method: Option<Method>,
    pub constraint: VersionConstraint,
}

#[derive(Debug, Default)]
struct PathRules {
    any_method: Option<VersionConstraint>,
    by_method: Vec<(Method, VersionConstraint)>,
}

/// Immutable route → constraint table.
#[derive(Debug, Default)]
pub struct RouteVersions {
    entries: Vec<RouteVersion>,
    by_path: HashMap<String, PathRules>,
}

impl RouteVersions {
    pub fn builder() -> RouteVersionsBuilder {
        RouteVersionsBuilder::default()
    }

    /// Find the constraint for a request to `path` with `method`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&VersionConstraint> {
        let rules = self.by_path.get(path)?;

        rules
            .by_method
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, constraint)| constraint)
            .or(rules.any_method.as_ref())
    }

    /// Registered routes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteVersion> {
        self.entries.iter()
    }

    /// Distinct route patterns in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::with_capacity(self.by_path.len());
        for entry in &self.entries {
            if !paths.contains(&entry.path.as_str()) {
                paths.push(&entry.path);
            }
        }
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse and validate a JSON rules document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for malformed JSON, unknown fields or
    /// methods, invalid constraints, and duplicate routes.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let file: RulesFile = serde_json::from_str(json)
            .map_err(|e| AppError::ConfigError(format!("Invalid version rules: {e}")))?;

        let mut builder = Self::builder();
        for rule in file.routes {
            let constraint = VersionConstraint::from_config(
                rule.header_required,
                rule.min_version,
                rule.max_version,
            );
            builder = match rule.method {
                Some(method) => builder.route_method(parse_method(&method)?, rule.path, constraint),
                None => builder.route(rule.path, constraint),
            };
        }
        builder.build()
    }

    /// Load a JSON rules file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the file cannot be read or fails
    /// [`RouteVersions::from_json_str`].
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::from_json_str(&content).map_err(|e| match e {
            AppError::ConfigError(msg) => {
                AppError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

/// Collects routes, validating everything in [`RouteVersionsBuilder::build`].
#[derive(Debug, Default)]
pub struct RouteVersionsBuilder {
    entries: Vec<RouteVersion>,
}

impl RouteVersionsBuilder {
    /// Gate every method of `path`.
    pub fn route(mut self, path: impl Into<String>, constraint: VersionConstraint) -> Self {
        self.entries.push(RouteVersion {
            path: path.into(),
            method: None,
            constraint,
        });
        self
    }

    /// Gate one method of `path`.
    pub fn route_method(
        mut self,
        method: Method,
        path: impl Into<String>,
        constraint: VersionConstraint,
    ) -> Self {
        self.entries.push(RouteVersion {
            path: path.into(),
            method: Some(method),
            constraint,
        });
        self
    }

    /// Validate and freeze the table.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a path is not a valid route
    /// pattern, two paths capture the same segment under different names, a
    /// constraint is invalid, or the same method and path appear twice.
    pub fn build(self) -> AppResult<RouteVersions> {
        let mut by_path: HashMap<String, PathRules> = HashMap::new();
        let mut patterns: Vec<(&str, Vec<Segment<'_>>)> = Vec::new();

        for entry in &self.entries {
            let segments = parse_pattern(&entry.path)?;
            if !patterns.iter().any(|(path, _)| *path == entry.path) {
                patterns.push((entry.path.as_str(), segments));
            }

            entry.constraint.validate().map_err(|e| match e {
                AppError::ConfigError(msg) => {
                    AppError::ConfigError(format!("Route '{}': {msg}", entry.path))
                }
                other => other,
            })?;

            let rules = by_path.entry(entry.path.clone()).or_default();
            let duplicate = match &entry.method {
                None => rules.any_method.replace(entry.constraint).is_some(),
                Some(method) => {
                    let seen = rules.by_method.iter().any(|(m, _)| m == method);
                    rules.by_method.push((method.clone(), entry.constraint));
                    seen
                }
            };

            if duplicate {
                let method = entry.method.as_ref().map_or("*", Method::as_str);
                return Err(AppError::ConfigError(format!(
                    "Duplicate version rule for {method} {}",
                    entry.path
                )));
            }
        }

        check_capture_conflicts(patterns)?;

        Ok(RouteVersions {
            entries: self.entries,
            by_path,
        })
    }
}

/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    /// `{name}`
    Capture(&'a str),
    /// `{*name}`, last segment only
    CatchAll(&'a str),
}

impl Segment<'_> {
    fn is_capture(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Split `path` into segments the router accepts.
///
/// Captures must fill a whole segment. The `:id` and `*rest` forms of older
/// axum versions are refused, as are escaped braces.
fn parse_pattern(path: &str) -> AppResult<Vec<Segment<'_>>> {
    let invalid =
        |reason: String| AppError::ConfigError(format!("Route path '{path}' {reason}"));

    let Some(rest) = path.strip_prefix('/') else {
        return Err(invalid("must start with '/'".to_string()));
    };

    let raw: Vec<&str> = rest.split('/').collect();
    let mut segments = Vec::with_capacity(raw.len());

    for (i, part) in raw.iter().enumerate() {
        if part.starts_with(':') || part.starts_with('*') {
            return Err(invalid(format!(
                "uses '{part}'; write captures as '{{name}}' or '{{*name}}'"
            )));
        }

        let segment = parse_segment(part)
            .ok_or_else(|| invalid(format!("has a malformed capture '{part}'")))?;

        if matches!(segment, Segment::CatchAll(_)) && i + 1 != raw.len() {
            return Err(invalid(format!(
                "has catch-all '{part}' before the last segment"
            )));
        }
        segments.push(segment);
    }

    Ok(segments)
}

fn parse_segment(part: &str) -> Option<Segment<'_>> {
    if !part.contains(['{', '}']) {
        return Some(Segment::Literal(part));
    }

    let inner = part.strip_prefix('{')?.strip_suffix('}')?;
    let (name, catch_all) = match inner.strip_prefix('*') {
        Some(name) => (name, true),
        None => (inner, false),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(if catch_all {
        Segment::CatchAll(name)
    } else {
        Segment::Capture(name)
    })
}

/// Refuse paths that share a prefix and then capture the same segment
/// under different names, e.g. `/a/{id}` and `/a/{name}`.
fn check_capture_conflicts(patterns: Vec<(&str, Vec<Segment<'_>>)>) -> AppResult<()> {
    for (i, (path, segments)) in patterns.iter().enumerate() {
        for (other_path, other) in patterns.iter().skip(i + 1) {
            let first_difference = segments
                .iter()
                .zip(other.iter())
                .find(|(a, b)| a != b);

            if let Some((a, b)) = first_difference
                && a.is_capture()
                && b.is_capture()
            {
                return Err(AppError::ConfigError(format!(
                    "Route paths '{path}' and '{other_path}' capture the same segment under different names"
                )));
            }
        }
    }

    Ok(())
}

fn parse_method(raw: &str) -> AppResult<Method> {
    let upper = raw.trim().to_uppercase();
    KNOWN_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| AppError::ConfigError(format!("Unknown HTTP method '{raw}'")))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRoute {
    path: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default = "default_true")]
    header_required: bool,
    #[serde(default)]
    min_version: Option<f32>,
    #[serde(default)]
    max_version: Option<f32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn two_to_three() -> VersionConstraint {
        VersionConstraint::builder().min(2.0).max(3.0).build()
    }

    #[test]
    fn test_lookup_any_method() {
        let routes = RouteVersions::builder()
            .route("/widgets", two_to_three())
            .build()
            .unwrap();

        assert_eq!(routes.lookup(&Method::GET, "/widgets"), Some(&two_to_three()));
        assert_eq!(routes.lookup(&Method::POST, "/widgets"), Some(&two_to_three()));
        assert_eq!(routes.lookup(&Method::GET, "/other"), None);
    }

    #[test]
    fn test_method_specific_entry_wins() {
        let post_only = VersionConstraint::builder().min(5.0).build();
        let routes = RouteVersions::builder()
            .route("/widgets", two_to_three())
            .route_method(Method::POST, "/widgets", post_only)
            .build()
            .unwrap();

        assert_eq!(routes.lookup(&Method::POST, "/widgets"), Some(&post_only));
        assert_eq!(routes.lookup(&Method::GET, "/widgets"), Some(&two_to_three()));
        assert_eq!(routes.len(), 2);
        assert_eq!(routes.paths(), vec!["/widgets"]);
    }

    #[test]
    fn test_method_only_entry_does_not_gate_other_methods() {
        let routes = RouteVersions::builder()
            .route_method(Method::DELETE, "/widgets/{id}", two_to_three())
            .build()
            .unwrap();

        assert!(routes.lookup(&Method::GET, "/widgets/{id}").is_none());
        assert!(routes.lookup(&Method::DELETE, "/widgets/{id}").is_some());
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = RouteVersions::builder()
            .route_method(Method::GET, "/widgets", two_to_three())
            .route_method(Method::GET, "/widgets", two_to_three())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate version rule for GET /widgets"));

        let err = RouteVersions::builder()
            .route("/widgets", two_to_three())
            .route("/widgets", two_to_three())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate version rule for * /widgets"));
    }

    #[test]
    fn test_path_must_start_with_slash() {
        let err = RouteVersions::builder()
            .route("widgets", two_to_three())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_old_capture_syntax_rejected() {
        for path in ["/users/:id", "/files/*rest"] {
            let err = RouteVersions::builder()
                .route(path, two_to_three())
                .build()
                .unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)));
            assert!(err.to_string().contains("write captures as '{name}'"), "{path}");
        }
    }

    #[test]
    fn test_malformed_captures_rejected() {
        for path in ["/users/{id", "/users/id}", "/users/{}", "/users/x{id}", "/users/{a-b}"] {
            let err = RouteVersions::builder()
                .route(path, two_to_three())
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("malformed capture"), "{path}");
        }
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let err = RouteVersions::builder()
            .route("/files/{*rest}/meta", two_to_three())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("before the last segment"));

        assert!(
            RouteVersions::builder()
                .route("/files/{*rest}", two_to_three())
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_capture_name_conflict_rejected() {
        let err = RouteVersions::builder()
            .route("/a/{id}", two_to_three())
            .route_method(Method::POST, "/a/{name}", two_to_three())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("'/a/{id}' and '/a/{name}'"));

        let err = RouteVersions::builder()
            .route("/a/{id}/x", two_to_three())
            .route("/a/{name}/y", two_to_three())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("capture the same segment"));
    }

    #[test]
    fn test_compatible_captures_accepted() {
        let routes = RouteVersions::builder()
            .route("/a/{id}", two_to_three())
            .route("/a/{id}/items/{item}", two_to_three())
            .route("/a/static", two_to_three())
            .route_method(Method::DELETE, "/a/{id}", two_to_three())
            .build()
            .unwrap();

        assert_eq!(routes.paths(), vec!["/a/{id}", "/a/{id}/items/{item}", "/a/static"]);
    }

    #[test]
    fn test_from_json_str_old_capture_syntax() {
        let err = RouteVersions::from_json_str(r#"{"routes":[{"path":"/users/:id"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Route path '/users/:id'"));
    }

    #[test]
    fn test_invalid_constraint_names_route() {
        let err = RouteVersions::builder()
            .route("/widgets", VersionConstraint::builder().min(3.0).max(2.0).build())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Route '/widgets'"));
    }

    #[test]
    fn test_from_json_str() {
        let routes = RouteVersions::from_json_str(
            r#"{
                "routes": [
                    { "path": "/required/noMinOrMax" },
                    { "path": "/widgets", "method": "get", "minVersion": 2, "maxVersion": 3 },
                    { "path": "/reports", "headerRequired": false, "minVersion": 0, "maxVersion": 2.0 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(routes.len(), 3);
        assert_eq!(
            routes.lookup(&Method::GET, "/required/noMinOrMax"),
            Some(&VersionConstraint::default())
        );
        assert_eq!(routes.lookup(&Method::GET, "/widgets"), Some(&two_to_three()));
        assert!(routes.lookup(&Method::POST, "/widgets").is_none());
        assert_eq!(
            routes.lookup(&Method::PUT, "/reports"),
            Some(&VersionConstraint::new(false, None, Some(2.0)))
        );
    }

    #[test]
    fn test_from_json_str_empty_document() {
        let routes = RouteVersions::from_json_str("{}").unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_from_json_str_unknown_field() {
        let err = RouteVersions::from_json_str(r#"{"routes": [{"path": "/a", "minVerison": 2}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid version rules"));
    }

    #[test]
    fn test_from_json_str_unknown_method() {
        let err = RouteVersions::from_json_str(r#"{"routes": [{"path": "/a", "method": "FETCH"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown HTTP method 'FETCH'"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = RouteVersions::from_file(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rules.json"));
    }
}
