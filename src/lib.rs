//! tour-planner core
//!
//! Heuristic delivery-tour planning over a remote routing service:
//! geographic clustering, capacity-constrained insertion, and
//! route-corridor pickup, with spherical geometry primitives and graceful
//! degradation when the service is oversized for its limits or unavailable.

pub mod error;
pub mod geo;
pub mod geojson;
pub mod matrix;
pub mod model;
pub mod normalize;
pub mod planner;
pub mod proximity;
pub mod reach;
pub mod scoring;
pub mod service;
pub mod tour;
