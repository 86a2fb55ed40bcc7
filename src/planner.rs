//! Tour planning orchestrator.
//!
//! Sequences normalization, matrix construction, scoring, seed selection,
//! reachability gating, per-seed tour building, route enrichment, and
//! corridor injection into one planning run. Validation failures reject
//! before any remote call; everything afterwards degrades into warnings,
//! because the contract is "always produce a best-effort plan".

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::error::PlanError;
use crate::geojson::is_valid_lonlat;
use crate::matrix::build_matrix;
use crate::model::{
    DistanceDurationMatrix, NormalizedClient, PlanRequest, PlannedStop, PlannedTour,
    TourPlanningResult,
};
use crate::normalize::normalize_clients;
use crate::reach::fetch_reachability;
use crate::scoring::{score_clients, select_seeds};
use crate::service::{self, RoutingService};
use crate::tour::{build_tour, enrich_route, inject_corridor, CAPACITY_EPS};

/// Runs one full planning invocation.
///
/// The remaining-clients pool and all per-tour accumulators live for this
/// call only and are touched strictly sequentially: seed N's tour is
/// built, enriched, and injected before seed N+1 begins.
pub fn plan_tours<S: RoutingService>(
    service: &S,
    request: &PlanRequest,
) -> Result<TourPlanningResult, PlanError> {
    validate(request)?;

    let options = &request.options;
    let capacity = request.truck_capacity_kg;
    let profile = options
        .profile
        .as_deref()
        .unwrap_or(service::DEFAULT_PROFILE);
    let reference = options.reference_time.unwrap_or_else(Utc::now);
    let mut warnings = Vec::new();

    let tour_count = if request.desired_tour_count > service::OPTIMIZATION_MAX_VEHICLES {
        warnings.push(format!(
            "desired tour count {} exceeds the service limit of {} vehicles; planning {} tours",
            request.desired_tour_count,
            service::OPTIMIZATION_MAX_VEHICLES,
            service::OPTIMIZATION_MAX_VEHICLES
        ));
        service::OPTIMIZATION_MAX_VEHICLES
    } else {
        request.desired_tour_count
    };

    let mut clients = normalize_clients(
        &request.clients,
        request.depot,
        reference,
        options.average_speed_kmh,
    )?;

    let matrix_outcome = build_matrix(
        service,
        profile,
        request.depot,
        &clients,
        options.average_speed_kmh,
        options.matrix_cell_ceiling,
    );
    warnings.extend(matrix_outcome.warnings);
    let matrix = matrix_outcome.matrix;

    score_clients(
        &mut clients,
        &matrix,
        options.cluster_radius_km,
        &options.weights,
    );
    let seed_indices = select_seeds(&mut clients, tour_count);
    let seeds: Vec<NormalizedClient> = seed_indices
        .iter()
        .map(|&index| clients[index].clone())
        .collect();

    let seed_refs: Vec<&NormalizedClient> = seeds.iter().collect();
    let reach = fetch_reachability(
        service,
        profile,
        &seed_refs,
        options.reach_minutes,
        options.max_isochrone_calls,
    );
    warnings.extend(reach.warnings);

    // Single-owner pool for this run; each tour drains it in turn.
    let mut remaining: BTreeMap<usize, NormalizedClient> = clients
        .iter()
        .cloned()
        .map(|client| (client.matrix_index, client))
        .collect();

    let mut tours = Vec::new();
    for seed in seeds {
        let seed_index = seed.matrix_index;
        if seed.weight_kg > capacity + CAPACITY_EPS {
            // Would overflow its own tour immediately; stays in the pool
            // and is reported with the other unroutable clients below.
            continue;
        }
        let Some(seed) = remaining.remove(&seed_index) else {
            // Absorbed into an earlier tour.
            continue;
        };
        debug!(seed = %seed.id, "building tour");

        let mut built = build_tour(
            seed,
            &mut remaining,
            &matrix,
            capacity,
            options.cluster_radius_km,
            options.max_stops_per_tour,
            reach.polygons.get(&seed_index),
        );
        let mut tour_warnings = std::mem::take(&mut built.warnings);

        let mut enriched = enrich_route(service, profile, request.depot, &built.stops);
        tour_warnings.extend(enriched.warnings);

        let injected = inject_corridor(
            &mut built.stops,
            &mut built.total_weight_kg,
            enriched.geometry.as_ref(),
            &mut remaining,
            &matrix,
            options.corridor_tolerance_km,
            capacity,
        );
        if injected {
            let again = enrich_route(service, profile, request.depot, &built.stops);
            tour_warnings.extend(again.warnings);
            if again.geometry.is_some() {
                enriched.geometry = again.geometry;
            }
        }

        let (total_distance_km, total_duration_min) = tour_totals(&built.stops, &matrix);
        tours.push(PlannedTour {
            id: format!("tour-{}", tours.len() + 1),
            stops: built.stops,
            total_weight_kg: built.total_weight_kg,
            total_distance_km,
            total_duration_min,
            geometry: enriched.geometry,
            warnings: tour_warnings,
        });
    }

    let unassigned: Vec<NormalizedClient> = remaining.into_values().collect();
    for client in &unassigned {
        if client.weight_kg > capacity + CAPACITY_EPS {
            warnings.push(format!(
                "client `{}` weighs {} kg, which alone exceeds the truck capacity of {} kg",
                client.id, client.weight_kg, capacity
            ));
        }
    }
    if !unassigned.is_empty() {
        warnings.push(format!(
            "{} clients could not be assigned to any tour",
            unassigned.len()
        ));
    }

    Ok(TourPlanningResult {
        tours,
        unassigned,
        warnings,
        weights: options.weights,
        reference_time: reference,
    })
}

fn validate(request: &PlanRequest) -> Result<(), PlanError> {
    if request.clients.is_empty() {
        return Err(PlanError::NoClients);
    }
    if !request.truck_capacity_kg.is_finite() || request.truck_capacity_kg <= 0.0 {
        return Err(PlanError::InvalidCapacity(request.truck_capacity_kg));
    }
    if request.desired_tour_count == 0 {
        return Err(PlanError::InvalidTourCount);
    }
    if !is_valid_lonlat(request.depot) {
        return Err(PlanError::InvalidCoordinate {
            context: "depot".to_string(),
        });
    }
    Ok(())
}

/// Matrix-leg totals for depot → stops → depot.
fn tour_totals(stops: &[PlannedStop], matrix: &DistanceDurationMatrix) -> (f64, f64) {
    let mut distance = 0.0;
    let mut duration = 0.0;
    let mut previous = 0usize;
    for stop in stops {
        let index = stop.client.matrix_index;
        distance += matrix.distance(previous, index);
        duration += matrix.duration(previous, index);
        previous = index;
    }
    distance += matrix.distance(previous, 0);
    duration += matrix.duration(previous, 0);
    (distance, duration)
}
