//! Per-route version constraints.
//!
//! A [`VersionConstraint`] states whether a route requires the version header
//! and which inclusive range of versions it supports. Either side of the range
//! may be unbounded.
//!
//! # Unbounded Sentinel
//!
//! Rules files and [`VersionConstraint::from_sentinels`] accept `0` as "no
//! bound on this side". Internally the bound is stored as `None`, so a literal
//! bound of exactly `0` cannot be expressed through those entry points.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Bound value that means "unbounded" at the configuration boundary.
pub const UNBOUNDED_SENTINEL: f32 = 0.0;

/// Immutable description of the versions a route accepts.
///
/// Built once at startup and shared by reference across requests.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "RawConstraint")]
pub struct VersionConstraint {
    header_required: bool,
    min_version: Option<f32>,
    max_version: Option<f32>,
}

impl VersionConstraint {
    /// Create a constraint from explicit optional bounds.
    pub fn new(header_required: bool, min_version: Option<f32>, max_version: Option<f32>) -> Self {
        Self {
            header_required,
            min_version,
            max_version,
        }
    }

    /// Create a constraint where a bound of `0` means unbounded.
    pub fn from_sentinels(header_required: bool, min_version: f32, max_version: f32) -> Self {
        Self::new(
            header_required,
            bound_from_sentinel(min_version),
            bound_from_sentinel(max_version),
        )
    }

    /// Map optional rules-file bounds, where both `null` and `0` mean unbounded.
    pub(crate) fn from_config(
        header_required: bool,
        min_version: Option<f32>,
        max_version: Option<f32>,
    ) -> Self {
        Self::new(
            header_required,
            min_version.and_then(bound_from_sentinel),
            max_version.and_then(bound_from_sentinel),
        )
    }

    /// Start building a constraint. Defaults to a required header with no bounds.
    pub fn builder() -> VersionConstraintBuilder {
        VersionConstraintBuilder::default()
    }

    /// Whether a missing header is itself a rejection.
    pub fn header_required(&self) -> bool {
        self.header_required
    }

    /// Inclusive lower bound, `None` when unbounded.
    pub fn min_version(&self) -> Option<f32> {
        self.min_version
    }

    /// Inclusive upper bound, `None` when unbounded.
    pub fn max_version(&self) -> Option<f32> {
        self.max_version
    }

    /// Check that a requested version lies within both bounds.
    ///
    /// Each unbounded side is skipped independently.
    pub fn contains(&self, version: f32) -> bool {
        self.min_version.is_none_or(|min| version >= min)
            && self.max_version.is_none_or(|max| version <= max)
    }

    /// Validate bounds for use in a route table.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a bound is negative or not finite,
    /// or if the minimum exceeds the maximum.
    pub fn validate(&self) -> AppResult<()> {
        for (name, bound) in [("minVersion", self.min_version), ("maxVersion", self.max_version)] {
            if let Some(value) = bound
                && (!value.is_finite() || value < 0.0)
            {
                return Err(AppError::ConfigError(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min_version, self.max_version)
            && min > max
        {
            return Err(AppError::ConfigError(format!(
                "minVersion ({min}) must be <= maxVersion ({max})"
            )));
        }

        Ok(())
    }
}

/// Required header, no bounds.
impl Default for VersionConstraint {
    fn default() -> Self {
        Self::new(true, None, None)
    }
}

/// Fluent builder for [`VersionConstraint`].
///
/// ```rust
/// use api_version_gate::VersionConstraint;
///
/// let constraint = VersionConstraint::builder().optional().min(2.0).max(3.0).build();
/// assert!(!constraint.header_required());
/// assert_eq!(constraint.min_version(), Some(2.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VersionConstraintBuilder {
    header_required: bool,
    min_version: Option<f32>,
    max_version: Option<f32>,
}

impl Default for VersionConstraintBuilder {
    fn default() -> Self {
        Self {
            header_required: true,
            min_version: None,
            max_version: None,
        }
    }
}

impl VersionConstraintBuilder {
    /// Set whether the version header must be present.
    pub fn required(mut self, header_required: bool) -> Self {
        self.header_required = header_required;
        self
    }

    /// Let requests without a version header through.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Set the inclusive lower bound.
    pub fn min(mut self, version: f32) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Set the inclusive upper bound.
    pub fn max(mut self, version: f32) -> Self {
        self.max_version = Some(version);
        self
    }

    pub fn build(self) -> VersionConstraint {
        VersionConstraint::new(self.header_required, self.min_version, self.max_version)
    }
}

fn bound_from_sentinel(value: f32) -> Option<f32> {
    (value != UNBOUNDED_SENTINEL).then_some(value)
}

pub(crate) fn default_true() -> bool {
    true
}

/// Wire shape of a constraint in a rules file.
///
/// Bounds may be omitted, `null`, or the `0` sentinel to mean unbounded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConstraint {
    #[serde(default = "default_true")]
    header_required: bool,
    #[serde(default)]
    min_version: Option<f32>,
    #[serde(default)]
    max_version: Option<f32>,
}

impl From<RawConstraint> for VersionConstraint {
    fn from(raw: RawConstraint) -> Self {
        Self::from_config(raw.header_required, raw.min_version, raw.max_version)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_required_and_unbounded() {
        let constraint = VersionConstraint::default();
        assert!(constraint.header_required());
        assert_eq!(constraint.min_version(), None);
        assert_eq!(constraint.max_version(), None);
    }

    #[test]
    fn test_from_sentinels_maps_zero_to_unbounded() {
        let constraint = VersionConstraint::from_sentinels(true, 0.0, 3.0);
        assert_eq!(constraint.min_version(), None);
        assert_eq!(constraint.max_version(), Some(3.0));

        let constraint = VersionConstraint::from_sentinels(false, 1.2, 0.0);
        assert_eq!(constraint.min_version(), Some(1.2));
        assert_eq!(constraint.max_version(), None);
    }

    #[test]
    fn test_builder() {
        let constraint = VersionConstraint::builder().optional().min(2.0).max(3.0).build();
        assert_eq!(constraint, VersionConstraint::new(false, Some(2.0), Some(3.0)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let constraint = VersionConstraint::builder().min(2.0).max(3.0).build();
        assert!(constraint.contains(2.0));
        assert!(constraint.contains(2.5));
        assert!(constraint.contains(3.0));
        assert!(!constraint.contains(1.99));
        assert!(!constraint.contains(3.01));
    }

    #[test]
    fn test_contains_with_one_side_unbounded() {
        let min_only = VersionConstraint::builder().min(2.0).build();
        assert!(min_only.contains(1000.0));
        assert!(!min_only.contains(1.0));

        let max_only = VersionConstraint::builder().max(2.0).build();
        assert!(max_only.contains(0.5));
        assert!(!max_only.contains(3.0));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let constraint = VersionConstraint::builder().min(3.0).max(2.0).build();
        let err = constraint.validate().unwrap_err();
        assert!(err.to_string().contains("minVersion"));
    }

    #[test]
    fn test_validate_rejects_negative_and_non_finite() {
        assert!(VersionConstraint::builder().min(-1.0).build().validate().is_err());
        assert!(
            VersionConstraint::builder()
                .max(f32::INFINITY)
                .build()
                .validate()
                .is_err()
        );
        assert!(VersionConstraint::builder().min(f32::NAN).build().validate().is_err());
    }

    #[test]
    fn test_validate_accepts_equal_bounds() {
        let constraint = VersionConstraint::builder().min(2.0).max(2.0).build();
        assert!(constraint.validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let constraint: VersionConstraint = serde_json::from_str("{}").unwrap();
        assert_eq!(constraint, VersionConstraint::default());
    }

    #[test]
    fn test_deserialize_sentinels_and_nulls() {
        let constraint: VersionConstraint = serde_json::from_str(
            r#"{"headerRequired": false, "minVersion": 0, "maxVersion": null}"#,
        )
        .unwrap();
        assert_eq!(constraint, VersionConstraint::new(false, None, None));

        let constraint: VersionConstraint =
            serde_json::from_str(r#"{"minVersion": 1.2, "maxVersion": 2}"#).unwrap();
        assert_eq!(constraint, VersionConstraint::new(true, Some(1.2), Some(2.0)));
    }
}
