//! Tour construction.
//!
//! Greedy capacity-constrained insertion around a seed client, optional
//! route-geometry enrichment through the directions endpoint, and
//! corridor injection of unassigned clients lying close to the actual
//! driving route.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::geo;
use crate::geojson::{Geometry, LonLat};
use crate::model::{DistanceDurationMatrix, NormalizedClient, PlannedStop};
use crate::proximity;
use crate::service::{self, RoutingService};

/// Floating-point slack applied to the capacity ceiling.
pub const CAPACITY_EPS: f64 = 1e-6;

const DISTANCE_EPS: f64 = 1e-9;

/// A built (but not yet enriched) tour.
#[derive(Debug, Clone)]
pub struct BuiltTour {
    pub stops: Vec<PlannedStop>,
    pub total_weight_kg: f64,
    pub warnings: Vec<String>,
}

/// Grows a tour around `seed` by repeated cheapest insertion.
///
/// Each round admits the remaining clients that still fit the capacity;
/// when a reachability polygon exists for the seed, a candidate must
/// additionally lie inside it or within the cluster radius of the seed
/// (the polygon is a bias, not a hard wall). Without a polygon only
/// capacity excludes. The admitted candidate with the highest
/// score × seed-proximity factor wins, ties broken by cheapest insertion,
/// and is placed at its cheapest position; the seed is never displaced
/// from the head of the tour.
pub fn build_tour(
    seed: NormalizedClient,
    remaining: &mut BTreeMap<usize, NormalizedClient>,
    matrix: &DistanceDurationMatrix,
    capacity_kg: f64,
    cluster_radius_km: f64,
    max_stops: usize,
    reach_polygon: Option<&Geometry>,
) -> BuiltTour {
    let seed_index = seed.matrix_index;
    let mut total_weight_kg = seed.weight_kg;
    let mut warnings = Vec::new();
    let mut stops = vec![PlannedStop {
        insertion_cost_km: matrix.distance(0, seed_index),
        position: 1,
        client: seed,
    }];

    loop {
        if stops.len() >= max_stops {
            let warning = format!("tour reached the {max_stops}-stop cap; stopped growing");
            warn!("{warning}");
            warnings.push(warning);
            break;
        }

        let mut best: Option<(usize, usize, f64, f64)> = None; // (index, position, cost, priority)
        for (&index, candidate) in remaining.iter() {
            if total_weight_kg + candidate.weight_kg > capacity_kg + CAPACITY_EPS {
                continue;
            }

            let seed_distance_km = matrix.distance(seed_index, index);
            if let Some(polygon) = reach_polygon {
                if !polygon.contains_point(candidate.location)
                    && seed_distance_km > cluster_radius_km
                {
                    continue;
                }
            }

            let factor = if seed_distance_km <= cluster_radius_km {
                1.0
            } else {
                cluster_radius_km / (seed_distance_km + DISTANCE_EPS)
            };
            let priority = candidate.score * factor;
            let (position, cost) = cheapest_insertion(&stops, index, matrix);

            let replace = match best {
                None => true,
                Some((_, _, best_cost, best_priority)) => {
                    priority > best_priority
                        || (priority == best_priority && cost < best_cost)
                }
            };
            if replace {
                best = Some((index, position, cost, priority));
            }
        }

        let Some((index, position, cost, _)) = best else {
            break;
        };
        let Some(client) = remaining.remove(&index) else {
            break;
        };
        debug!(client = %client.id, position, cost, "inserting stop");
        total_weight_kg += client.weight_kg;
        stops.insert(
            position,
            PlannedStop {
                client,
                position: 0,
                insertion_cost_km: cost,
            },
        );
        renumber(&mut stops);
    }

    renumber(&mut stops);
    BuiltTour {
        stops,
        total_weight_kg,
        warnings,
    }
}

/// Cheapest insertion point for a candidate in the current stop sequence.
///
/// Position 0 is locked for the seed; the virtual terminal after the last
/// stop is the depot (matrix index 0). Cost is the added distance
/// `d(prev, c) + d(c, next) - d(prev, next)`.
fn cheapest_insertion(
    stops: &[PlannedStop],
    candidate: usize,
    matrix: &DistanceDurationMatrix,
) -> (usize, f64) {
    let mut best_position = stops.len();
    let mut best_cost = f64::INFINITY;

    for position in 1..=stops.len() {
        let prev = stops[position - 1].client.matrix_index;
        let next = stops.get(position).map_or(0, |stop| stop.client.matrix_index);
        let cost = matrix.distance(prev, candidate) + matrix.distance(candidate, next)
            - matrix.distance(prev, next);
        if cost < best_cost {
            best_cost = cost;
            best_position = position;
        }
    }

    (best_position, best_cost)
}

fn renumber(stops: &mut [PlannedStop]) {
    for (i, stop) in stops.iter_mut().enumerate() {
        stop.position = i + 1;
    }
}

/// Route enrichment outcome: geometry when the directions call was both
/// allowed and successful.
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub geometry: Option<Geometry>,
    pub warnings: Vec<String>,
}

/// Requests actual driving geometry through depot → stops → depot.
///
/// Skipped when the waypoint count exceeds the service limit; any failure
/// simply leaves the tour without geometry.
pub fn enrich_route<S: RoutingService>(
    service: &S,
    profile: &str,
    depot: LonLat,
    stops: &[PlannedStop],
) -> EnrichOutcome {
    let waypoints = stops.len() + 2;
    if waypoints > service::DIRECTIONS_MAX_WAYPOINTS {
        let warning = format!(
            "skipping route geometry: {waypoints} waypoints exceeds the service limit of {}",
            service::DIRECTIONS_MAX_WAYPOINTS
        );
        warn!("{warning}");
        return EnrichOutcome {
            geometry: None,
            warnings: vec![warning],
        };
    }

    let mut coordinates = Vec::with_capacity(waypoints);
    coordinates.push(depot);
    coordinates.extend(stops.iter().map(|stop| stop.client.location));
    coordinates.push(depot);

    match service.directions(profile, &coordinates) {
        Ok(geometry) => {
            debug!(length_km = geo::line_length(&geometry), "route geometry fetched");
            EnrichOutcome {
                geometry: Some(geometry),
                warnings: Vec::new(),
            }
        }
        Err(error) => {
            let warning = format!("directions request failed ({error}); tour geometry unavailable");
            warn!("{warning}");
            EnrichOutcome {
                geometry: None,
                warnings: vec![warning],
            }
        }
    }
}

/// Pulls remaining clients lying within `tolerance_km` of the enriched
/// route into the tour, by descending score, capacity permitting.
///
/// A tour without geometry is a no-op. Returns whether anything was
/// inserted, signalling that a re-enrichment pass is worthwhile.
pub fn inject_corridor(
    stops: &mut Vec<PlannedStop>,
    total_weight_kg: &mut f64,
    geometry: Option<&Geometry>,
    remaining: &mut BTreeMap<usize, NormalizedClient>,
    matrix: &DistanceDurationMatrix,
    tolerance_km: f64,
    capacity_kg: f64,
) -> bool {
    let Some(geometry) = geometry else {
        return false;
    };

    let mut nearby: Vec<(usize, f64)> = remaining
        .iter()
        .filter_map(|(&index, candidate)| {
            match proximity::route_distance(geometry, candidate.location, Some(tolerance_km)) {
                Ok(p) if p.within_tolerance => Some((index, candidate.score)),
                _ => None,
            }
        })
        .collect();
    nearby.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut inserted = false;
    for (index, _) in nearby {
        let Some(weight) = remaining.get(&index).map(|c| c.weight_kg) else {
            continue;
        };
        if *total_weight_kg + weight > capacity_kg + CAPACITY_EPS {
            continue;
        }
        let (position, cost) = cheapest_insertion(stops, index, matrix);
        let Some(client) = remaining.remove(&index) else {
            continue;
        };
        debug!(client = %client.id, position, cost, "corridor pickup");
        *total_weight_kg += weight;
        stops.insert(
            position,
            PlannedStop {
                client,
                position: 0,
                insertion_cost_km: cost,
            },
        );
        inserted = true;
    }

    renumber(stops);
    inserted
}
