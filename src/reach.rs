//! Isochrone-based reachability gate.
//!
//! Fetches a reachable-area polygon around each seed, clamped to the
//! service's per-mode-group reach cap, so candidate admission can be
//! biased toward clients inside a seed's realistic reach. Degrades per
//! seed: a failed request leaves that seed on radius-only gating, and
//! unsupported profiles disable the gate entirely.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::geo;
use crate::geojson::Geometry;
use crate::model::NormalizedClient;
use crate::service::{self, RoutingService};

/// Reachability polygons keyed by seed matrix index, plus warnings.
#[derive(Debug, Clone, Default)]
pub struct ReachOutcome {
    pub polygons: HashMap<usize, Geometry>,
    pub warnings: Vec<String>,
}

/// Fetches reachability polygons for the given seeds, in seed order.
///
/// Issues at most `min(budget, service location limit)` requests. A
/// non-positive reach window, an empty seed list, or a profile without a
/// supported reach cap all return no polygons.
pub fn fetch_reachability<S: RoutingService>(
    service: &S,
    profile: &str,
    seeds: &[&NormalizedClient],
    reach_minutes: f64,
    budget: usize,
) -> ReachOutcome {
    let mut outcome = ReachOutcome::default();
    if reach_minutes <= 0.0 || seeds.is_empty() {
        return outcome;
    }

    let Some(cap_minutes) = service::isochrone_reach_cap_minutes(profile) else {
        let warning =
            format!("reachability gating disabled: profile `{profile}` does not support isochrones");
        warn!("{warning}");
        outcome.warnings.push(warning);
        return outcome;
    };

    let minutes = reach_minutes.min(cap_minutes);
    let budget = budget.min(service::ISOCHRONES_MAX_LOCATIONS);

    for seed in seeds.iter().take(budget) {
        match service.isochrone(profile, seed.location, minutes * 60.0) {
            Ok(geometry) => {
                debug!(
                    seed = %seed.id,
                    area_km2 = geo::area(&geometry),
                    "reachability polygon fetched"
                );
                outcome.polygons.insert(seed.matrix_index, geometry);
            }
            Err(error) => {
                let warning = format!(
                    "isochrone request failed for seed `{}` ({error}); falling back to radius gating",
                    seed.id
                );
                warn!("{warning}");
                outcome.warnings.push(warning);
            }
        }
    }

    outcome
}
