//! Route proximity evaluator.
//!
//! Flattens an arbitrary route geometry to line segments and computes the
//! minimum spherical distance from a point to any segment, using
//! cross-track / along-track decomposition on the great circle through
//! each segment. Drives the corridor membership test.

use crate::error::PlanError;
use crate::geo::{self, EARTH_RADIUS_KM};
use crate::geojson::{is_valid_lonlat, lonlat, Geometry, LonLat};

/// Tolerance applied when the caller passes none (or a non-positive one).
pub const DEFAULT_TOLERANCE_KM: f64 = 0.1;

/// Outcome of a point-against-route evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProximity {
    /// Minimum distance from the point to any segment of the route, km.
    pub distance_km: f64,
    /// Whether that distance is within the effective tolerance.
    pub within_tolerance: bool,
    /// The tolerance actually applied.
    pub tolerance_km: f64,
}

/// Minimum spherical distance from `point` to any segment of `route`.
///
/// The route may be a line, a multi-line, a feature wrapping either, or a
/// collection of such features; it is flattened by recursive descent.
/// Lines with fewer than two usable coordinates contribute nothing.
///
/// Fails when the point is not a finite (lon, lat) pair or the route
/// flattens to zero usable segments.
pub fn route_distance(
    route: &Geometry,
    point: LonLat,
    tolerance_km: Option<f64>,
) -> Result<RouteProximity, PlanError> {
    if !is_valid_lonlat(point) {
        return Err(PlanError::InvalidCoordinate {
            context: "proximity target".to_string(),
        });
    }

    let tolerance = match tolerance_km {
        Some(t) if t > 0.0 => t,
        _ => DEFAULT_TOLERANCE_KM,
    };

    let mut lines = Vec::new();
    route.collect_lines(&mut lines);

    let mut best: Option<f64> = None;
    for line in lines {
        let points: Vec<LonLat> = line.iter().filter_map(|p| lonlat(p)).collect();
        if points.len() < 2 {
            continue;
        }
        for segment in points.windows(2) {
            let d = point_to_segment_km(point, segment[0], segment[1]);
            best = Some(best.map_or(d, |b: f64| b.min(d)));
        }
    }

    let distance_km = best.ok_or(PlanError::EmptyRouteGeometry)?;
    Ok(RouteProximity {
        distance_km,
        within_tolerance: distance_km <= tolerance,
        tolerance_km: tolerance,
    })
}

/// Convenience wrapper returning only the containment verdict.
pub fn is_near_route(
    route: &Geometry,
    point: LonLat,
    tolerance_km: Option<f64>,
) -> Result<bool, PlanError> {
    route_distance(route, point, tolerance_km).map(|proximity| proximity.within_tolerance)
}

/// Spherical distance from a point to a great-circle segment, km.
///
/// When the along-track projection falls before the segment start the
/// distance is to the start point; beyond the end, to the end point;
/// otherwise the perpendicular cross-track distance applies. Degenerate
/// segments resolve to point-to-point distance.
fn point_to_segment_km(point: LonLat, start: LonLat, end: LonLat) -> f64 {
    let segment_km = geo::distance(start, end);
    if segment_km < 1e-9 {
        return geo::distance(start, point);
    }

    let start_to_point_km = geo::distance(start, point);
    if start_to_point_km < 1e-9 {
        return 0.0;
    }

    let bearing_point = geo::initial_bearing(start, point);
    let bearing_end = geo::initial_bearing(start, end);
    let relative = bearing_point - bearing_end;

    // Projection falls behind the segment start.
    if relative.cos() < 0.0 {
        return start_to_point_km;
    }

    let angular = start_to_point_km / EARTH_RADIUS_KM;
    let cross_track = (angular.sin() * relative.sin()).asin();
    let along_track_km =
        (angular.cos() / cross_track.cos()).clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM;

    if along_track_km > segment_km {
        return geo::distance(end, point);
    }

    cross_track.abs() * EARTH_RADIUS_KM
}
