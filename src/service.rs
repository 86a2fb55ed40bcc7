//! Routing service seam and HTTP adapter.
//!
//! The planner consumes three capability shapes (matrix, isochrones,
//! directions) through the `RoutingService` trait. `OrsClient` is the
//! blocking HTTP implementation against an openrouteservice-compatible
//! endpoint; tests substitute mocks at the trait seam.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::geojson::{Geometry, LonLat};

/// Default routing profile.
pub const DEFAULT_PROFILE: &str = "driving-car";

/// Matrix locations² ceiling before the planner falls back to haversine.
pub const MATRIX_MAX_CELLS: usize = 3_500;

/// Per-request isochrone location cap, reused as the default per-run
/// isochrone call budget.
pub const ISOCHRONES_MAX_LOCATIONS: usize = 5;

/// Waypoint ceiling above which route enrichment is skipped.
pub const DIRECTIONS_MAX_WAYPOINTS: usize = 50;

/// Vehicle cap of the delegated optimization endpoint; the desired tour
/// count is clamped to it.
pub const OPTIMIZATION_MAX_VEHICLES: usize = 3;

/// Documented per-mode-group isochrone reach caps, in minutes.
///
/// Returns `None` for profiles the reachability gate cannot serve at all;
/// wheelchair profiles are unsupported upstream entirely.
pub fn isochrone_reach_cap_minutes(profile: &str) -> Option<f64> {
    if profile.starts_with("wheelchair") {
        return None;
    }
    if profile.starts_with("driving") {
        Some(60.0)
    } else if profile.starts_with("cycling") {
        Some(50.0)
    } else if profile.starts_with("foot") {
        Some(80.0)
    } else {
        None
    }
}

/// A remote call failed. Never escapes the planner; every call site
/// degrades into a warning and a fallback path.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Raw matrix response: distances in meters, durations in seconds, either
/// table and any individual cell possibly absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixResponse {
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

/// The remote capabilities the planner needs, in planner terms.
pub trait RoutingService {
    /// All-pairs distances/durations for the given locations.
    fn matrix(&self, profile: &str, locations: &[LonLat]) -> Result<MatrixResponse, ServiceError>;

    /// Reachable-area geometry around one location for a time range in
    /// seconds.
    fn isochrone(
        &self,
        profile: &str,
        location: LonLat,
        range_seconds: f64,
    ) -> Result<Geometry, ServiceError>;

    /// Route geometry through an ordered coordinate sequence, instructions
    /// disabled, GeoJSON geometry enabled.
    fn directions(&self, profile: &str, coordinates: &[LonLat]) -> Result<Geometry, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Blocking HTTP client for an openrouteservice-compatible API.
#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .post(url)
            .header("Authorization", &self.config.api_key)
            .json(&body)
            .send()?
            .error_for_status()?;

        Ok(response.json::<T>()?)
    }
}

fn coordinate_pairs(locations: &[LonLat]) -> Vec<[f64; 2]> {
    locations.iter().map(|(lon, lat)| [*lon, *lat]).collect()
}

impl RoutingService for OrsClient {
    fn matrix(&self, profile: &str, locations: &[LonLat]) -> Result<MatrixResponse, ServiceError> {
        self.post(
            &format!("/v2/matrix/{profile}"),
            json!({
                "locations": coordinate_pairs(locations),
                "metrics": ["distance", "duration"],
            }),
        )
    }

    fn isochrone(
        &self,
        profile: &str,
        location: LonLat,
        range_seconds: f64,
    ) -> Result<Geometry, ServiceError> {
        self.post(
            &format!("/v2/isochrones/{profile}"),
            json!({
                "locations": [[location.0, location.1]],
                "range": [range_seconds],
                "range_type": "time",
            }),
        )
    }

    fn directions(&self, profile: &str, coordinates: &[LonLat]) -> Result<Geometry, ServiceError> {
        self.post(
            &format!("/v2/directions/{profile}/geojson"),
            json!({
                "coordinates": coordinate_pairs(coordinates),
                "instructions": false,
                "geometry": true,
            }),
        )
    }
}
