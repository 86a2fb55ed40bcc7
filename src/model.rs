//! Planner data model.
//!
//! Inputs (`Client`, `PlanRequest`) are immutable once handed to a
//! planning call. Derived records (`NormalizedClient`) are owned by a
//! single planning invocation and mutated in place by the scoring stage
//! only; nothing here is shared across calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geojson::{Geometry, LonLat};
use crate::service;

/// A raw delivery client as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Optional identifier; defaults to a generated sequence label.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// (longitude, latitude).
    pub location: LonLat,
    /// Positive weight in kilograms.
    pub weight_kg: f64,
    /// Order timestamp; RFC 3339 or `YYYY-MM-DD [HH:MM:SS]`.
    pub order_date: String,
    #[serde(default)]
    pub urgent: bool,
}

/// A client after validation and enrichment, carrying its stable matrix
/// index (depot is index 0, clients 1..N in input order).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedClient {
    pub id: String,
    pub name: String,
    pub location: LonLat,
    pub weight_kg: f64,
    pub urgent: bool,
    pub order_date: DateTime<Utc>,
    /// Age of the order in days, floored at zero.
    pub age_days: f64,
    /// Distance from the depot, km. Straight-line at normalization time,
    /// overwritten with the matrix value by the scoring stage.
    pub depot_distance_km: f64,
    /// Estimated drive time from the depot, minutes.
    pub depot_duration_min: f64,
    /// 1-based position in the distance/duration matrices.
    pub matrix_index: usize,
    /// Number of other clients within the neighbor radius.
    pub neighbor_count: usize,
    /// Blended priority score.
    pub score: f64,
    /// Whether this client anchors a tour.
    pub is_seed: bool,
}

/// All-pairs kilometers and minutes, indexed by matrix index.
///
/// Square, size 1 + client count, diagonal zero. Symmetry is not assumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceDurationMatrix {
    pub distances_km: Vec<Vec<f64>>,
    pub durations_min: Vec<Vec<f64>>,
}

impl DistanceDurationMatrix {
    pub fn len(&self) -> usize {
        self.distances_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances_km.is_empty()
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances_km[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations_min[from][to]
    }
}

/// A client placed on a tour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStop {
    pub client: NormalizedClient,
    /// 1-based visiting position within the tour.
    pub position: usize,
    /// Marginal distance added by inserting this stop, km.
    pub insertion_cost_km: f64,
}

/// One ordered delivery tour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTour {
    pub id: String,
    pub stops: Vec<PlannedStop>,
    pub total_weight_kg: f64,
    /// Depot → stops → depot, summed over matrix legs.
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    /// Actual driving geometry, when the directions call succeeded.
    pub geometry: Option<Geometry>,
    pub warnings: Vec<String>,
}

/// Terminal output of one planning invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourPlanningResult {
    pub tours: Vec<PlannedTour>,
    pub unassigned: Vec<NormalizedClient>,
    pub warnings: Vec<String>,
    pub weights: ScoreWeights,
    pub reference_time: DateTime<Utc>,
}

/// Blend weights for the priority score. Fractions, conventionally summing
/// to 1, but deliberately unclamped: they are a policy knob, not user
/// input needing sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub age: f64,
    pub distance: f64,
    pub cluster: f64,
    pub urgent: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            age: 0.5,
            distance: 0.25,
            cluster: 0.15,
            urgent: 0.1,
        }
    }
}

/// Tuning knobs for one planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Assumed driving speed for haversine-derived durations, km/h.
    pub average_speed_kmh: f64,
    /// Neighbor-count and seed-proximity radius, km.
    pub cluster_radius_km: f64,
    /// Corridor membership tolerance around enriched routes, km.
    pub corridor_tolerance_km: f64,
    /// Safety cap on stops per tour.
    pub max_stops_per_tour: usize,
    /// Isochrone reach window, minutes. Non-positive disables the gate.
    pub reach_minutes: f64,
    /// Ceiling on per-run isochrone requests.
    pub max_isochrone_calls: usize,
    /// Ceiling on matrix cells (locations²) before falling back.
    pub matrix_cell_ceiling: usize,
    pub weights: ScoreWeights,
    /// Reference instant for age computation; defaults to now.
    pub reference_time: Option<DateTime<Utc>>,
    /// Routing profile; defaults to the service default.
    pub profile: Option<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            average_speed_kmh: 50.0,
            cluster_radius_km: 5.0,
            corridor_tolerance_km: 1.0,
            max_stops_per_tour: 25,
            reach_minutes: 30.0,
            max_isochrone_calls: service::ISOCHRONES_MAX_LOCATIONS,
            matrix_cell_ceiling: service::MATRIX_MAX_CELLS,
            weights: ScoreWeights::default(),
            reference_time: None,
            profile: None,
        }
    }
}

/// One full planning request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Depot location, (longitude, latitude).
    pub depot: LonLat,
    pub clients: Vec<Client>,
    pub truck_capacity_kg: f64,
    pub desired_tour_count: usize,
    pub options: PlanOptions,
}
