//! HTTP middleware for API version gating.
//!
//! # Architecture
//!
//! ```text
//! Request → Request ID → Trace → CORS → Router → Version Gate → Handler
//!                                                     ↓
//!                                          400 Bad Request + payload
//! ```
//!
//! The gate runs as a route layer, after routing, so it sees the matched
//! route pattern rather than the raw path.

pub mod version_gate;

pub use version_gate::{VersionGateLayer, VersionGateService};
