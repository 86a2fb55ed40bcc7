//! Caller-facing validation errors.
//!
//! Validation failures surface before any remote call is made. Everything
//! downstream of a valid request degrades into warnings instead (see the
//! matrix, reach, and tour modules).

use thiserror::Error;

/// A request was malformed and planning never started.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no clients supplied")]
    NoClients,

    #[error("truck capacity must be positive, got {0}")]
    InvalidCapacity(f64),

    #[error("desired tour count must be at least 1")]
    InvalidTourCount,

    #[error("invalid coordinate for {context}: expected two finite numbers")]
    InvalidCoordinate { context: String },

    #[error("unparseable order date `{0}`")]
    InvalidOrderDate(String),

    #[error("route geometry contains no usable line segments")]
    EmptyRouteGeometry,
}
