//! Header-based API version gating.
//!
//! - [`VersionConstraint`]: what a route accepts
//! - [`VersionGate`]: accept/reject decision and rejection payload
//! - [`RouteVersions`]: which constraint applies to which route

mod constraint;
mod gate;
mod registry;

pub use constraint::{UNBOUNDED_SENTINEL, VersionConstraint, VersionConstraintBuilder};
pub use gate::{
    DEFAULT_VERSION_HEADER, Decision, DefaultVersionMatcher, NO_MAXIMUM_VERSION,
    NO_MINIMUM_VERSION, RejectionPayload, VersionGate, VersionMatcher, parse_version,
};
pub use registry::{RouteVersion, RouteVersions, RouteVersionsBuilder};
