//! Distance/duration matrix provider.
//!
//! Asks the routing service for an all-pairs matrix over depot + clients,
//! enforcing the cell-count ceiling, and synthesizes the matrix from
//! great-circle distances whenever the remote call is skipped or fails.
//! Individual missing cells are substituted per cell. Never fails; every
//! degradation is reported through warnings.

use rayon::prelude::*;
use tracing::warn;

use crate::geo;
use crate::geojson::LonLat;
use crate::model::{DistanceDurationMatrix, NormalizedClient};
use crate::service::{MatrixResponse, RoutingService};

const METERS_PER_KM: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// A complete matrix plus the warnings accumulated building it.
#[derive(Debug, Clone)]
pub struct MatrixOutcome {
    pub matrix: DistanceDurationMatrix,
    pub warnings: Vec<String>,
}

/// Builds the matrix for `[depot, clients...]`, falling back to haversine
/// estimates when the location count squared exceeds `cell_ceiling` or the
/// remote call fails.
pub fn build_matrix<S: RoutingService>(
    service: &S,
    profile: &str,
    depot: LonLat,
    clients: &[NormalizedClient],
    average_speed_kmh: f64,
    cell_ceiling: usize,
) -> MatrixOutcome {
    let mut locations = Vec::with_capacity(clients.len() + 1);
    locations.push(depot);
    locations.extend(clients.iter().map(|client| client.location));

    let cells = locations.len() * locations.len();
    if cells > cell_ceiling {
        let warning = format!(
            "matrix request for {} locations ({cells} cells) exceeds the {cell_ceiling}-cell limit; using haversine estimates",
            locations.len()
        );
        warn!("{warning}");
        return MatrixOutcome {
            matrix: synthesize(&locations, average_speed_kmh),
            warnings: vec![warning],
        };
    }

    match service.matrix(profile, &locations) {
        Ok(response) => fill(&locations, response, average_speed_kmh),
        Err(error) => {
            let warning = format!("matrix request failed ({error}); using haversine estimates");
            warn!("{warning}");
            MatrixOutcome {
                matrix: synthesize(&locations, average_speed_kmh),
                warnings: vec![warning],
            }
        }
    }
}

/// Converts a remote response into km/minute matrices, substituting a
/// haversine estimate for each individually missing cell.
fn fill(locations: &[LonLat], response: MatrixResponse, average_speed_kmh: f64) -> MatrixOutcome {
    let n = locations.len();
    let mut distances_km = vec![vec![0.0; n]; n];
    let mut durations_min = vec![vec![0.0; n]; n];
    let mut missing = 0usize;

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let estimate_km = geo::distance(locations[i], locations[j]);

            distances_km[i][j] = match cell(&response.distances, i, j) {
                Some(meters) => meters / METERS_PER_KM,
                None => {
                    missing += 1;
                    estimate_km
                }
            };
            durations_min[i][j] = match cell(&response.durations, i, j) {
                Some(seconds) => seconds / SECONDS_PER_MINUTE,
                None => {
                    missing += 1;
                    estimate_km / average_speed_kmh * 60.0
                }
            };
        }
    }

    let mut warnings = Vec::new();
    if missing > 0 {
        let warning =
            format!("{missing} matrix cells were missing; substituted haversine estimates");
        warn!("{warning}");
        warnings.push(warning);
    }

    MatrixOutcome {
        matrix: DistanceDurationMatrix {
            distances_km,
            durations_min,
        },
        warnings,
    }
}

fn cell(table: &Option<Vec<Vec<Option<f64>>>>, i: usize, j: usize) -> Option<f64> {
    table
        .as_ref()?
        .get(i)?
        .get(j)
        .copied()
        .flatten()
        .filter(|value| value.is_finite())
}

/// All-pairs haversine matrix with speed-derived durations.
fn synthesize(locations: &[LonLat], average_speed_kmh: f64) -> DistanceDurationMatrix {
    let distances_km: Vec<Vec<f64>> = locations
        .par_iter()
        .map(|from| {
            locations
                .iter()
                .map(|to| geo::distance(*from, *to))
                .collect()
        })
        .collect();

    let durations_min = distances_km
        .iter()
        .map(|row| {
            row.iter()
                .map(|km| km / average_speed_kmh * 60.0)
                .collect()
        })
        .collect();

    DistanceDurationMatrix {
        distances_km,
        durations_min,
    }
}
