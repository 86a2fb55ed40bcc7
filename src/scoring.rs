//! Priority scoring and seed selection.
//!
//! Refreshes each client's depot metrics from the matrix, counts
//! neighbors within a radius, blends age / distance / cluster density /
//! urgency into a single score, and picks the top scorers as tour seeds.
//! Mutates the normalized records in place; they are owned by a single
//! planning invocation.

use crate::model::{DistanceDurationMatrix, NormalizedClient, ScoreWeights};

const NEAR_ZERO: f64 = 1e-9;

/// Scores all clients in place.
///
/// Age, depot distance, and neighbor count are each normalized by the
/// maximum observed value across the set (a vanishing maximum normalizes
/// to zero); urgency contributes 1 or 0. The blend is deliberately
/// unclamped beyond the weights themselves.
pub fn score_clients(
    clients: &mut [NormalizedClient],
    matrix: &DistanceDurationMatrix,
    neighbor_radius_km: f64,
    weights: &ScoreWeights,
) {
    count_neighbors(clients, matrix, neighbor_radius_km);
    refresh_depot_metrics(clients, matrix);

    let max_age = fold_max(clients.iter().map(|c| c.age_days));
    let max_distance = fold_max(clients.iter().map(|c| c.depot_distance_km));
    let max_neighbors = fold_max(clients.iter().map(|c| c.neighbor_count as f64));

    for client in clients.iter_mut() {
        let age_norm = normalize(client.age_days, max_age);
        let distance_norm = normalize(client.depot_distance_km, max_distance);
        let neighbor_norm = normalize(client.neighbor_count as f64, max_neighbors);
        let urgent = if client.urgent { 1.0 } else { 0.0 };

        client.score = weights.age * age_norm
            + weights.distance * distance_norm
            + weights.cluster * neighbor_norm
            + weights.urgent * urgent;
    }
}

fn count_neighbors(
    clients: &mut [NormalizedClient],
    matrix: &DistanceDurationMatrix,
    radius_km: f64,
) {
    let indices: Vec<usize> = clients.iter().map(|c| c.matrix_index).collect();
    for client in clients.iter_mut() {
        client.neighbor_count = indices
            .iter()
            .filter(|&&other| {
                other != client.matrix_index
                    && matrix.distance(client.matrix_index, other) <= radius_km
            })
            .count();
    }
}

/// Overwrites the straight-line depot estimates with matrix values.
fn refresh_depot_metrics(clients: &mut [NormalizedClient], matrix: &DistanceDurationMatrix) {
    for client in clients.iter_mut() {
        if client.matrix_index < matrix.len() {
            client.depot_distance_km = matrix.distance(0, client.matrix_index);
            client.depot_duration_min = matrix.duration(0, client.matrix_index);
        }
    }
}

fn fold_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

fn normalize(value: f64, max: f64) -> f64 {
    if max < NEAR_ZERO {
        0.0
    } else {
        value / max
    }
}

/// Marks up to `desired` clients as seeds and returns their slice indices
/// in selection order.
///
/// Candidates are walked by descending score, ties broken by descending
/// age; non-positive weights can never anchor a tour and duplicate
/// identifiers are skipped. Fewer qualifying clients simply yield fewer
/// seeds.
pub fn select_seeds(clients: &mut [NormalizedClient], desired: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..clients.len()).collect();
    order.sort_by(|&a, &b| {
        clients[b]
            .score
            .partial_cmp(&clients[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                clients[b]
                    .age_days
                    .partial_cmp(&clients[a].age_days)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut seeds = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for index in order {
        if seeds.len() == desired {
            break;
        }
        let client = &clients[index];
        if client.weight_kg <= 0.0 || !seen.insert(client.id.clone()) {
            continue;
        }
        seeds.push(index);
    }

    for &index in &seeds {
        clients[index].is_seed = true;
    }
    seeds
}
