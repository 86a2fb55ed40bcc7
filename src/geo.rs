//! Spherical geometry kernel.
//!
//! Pure functions over (lon, lat) coordinates: great-circle distance,
//! approximate areas, and path lengths. Used throughout scoring, the
//! matrix fallback, and corridor tests. Malformed or non-finite
//! coordinates are skipped rather than rejected.

use crate::geojson::{lonlat, Geometry, LonLat, Position};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lon, lat) points in kilometers.
pub fn distance(a: LonLat, b: LonLat) -> f64 {
    let (lon1, lat1) = a;
    let (lon2, lat2) = b;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b`, in radians.
pub fn initial_bearing(a: LonLat, b: LonLat) -> f64 {
    let (lon1, lat1) = a;
    let (lon2, lat2) = b;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();
    y.atan2(x)
}

/// Approximate area of an axis-aligned `[min_lon, min_lat, max_lon, max_lat]`
/// box in km², as width × height measured along the box edges at the
/// minimum corner. Good enough for soft limit checks, not cartography.
pub fn bounding_box_area(bbox: [f64; 4]) -> f64 {
    let [min_lon, min_lat, max_lon, max_lat] = bbox;
    if !bbox.iter().all(|v| v.is_finite()) {
        return 0.0;
    }
    let width = distance((min_lon, min_lat), (max_lon, min_lat));
    let height = distance((min_lon, min_lat), (min_lon, max_lat));
    width * height
}

/// Area of a polygon (outer ring minus holes) in km², via the shoelace
/// formula on a local equirectangular projection scaled by the cosine of
/// the outer ring's mean latitude. Clamped to non-negative.
pub fn polygon_area(rings: &[Vec<Position>]) -> f64 {
    let Some(outer) = rings.first() else {
        return 0.0;
    };
    let outer_area = ring_area(outer);
    let holes: f64 = rings[1..].iter().map(|ring| ring_area(ring)).sum();
    (outer_area - holes).max(0.0)
}

fn ring_area(ring: &[Position]) -> f64 {
    let vertices: Vec<LonLat> = ring.iter().filter_map(|p| lonlat(p)).collect();
    if vertices.len() < 3 {
        return 0.0;
    }

    let mean_lat = vertices.iter().map(|(_, lat)| lat).sum::<f64>() / vertices.len() as f64;
    let scale = mean_lat.to_radians().cos();

    let mut doubled = 0.0;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = project(vertices[i], scale);
        let (xj, yj) = project(vertices[j], scale);
        doubled += xj * yi - xi * yj;
        j = i;
    }
    (doubled / 2.0).abs()
}

fn project(point: LonLat, scale: f64) -> (f64, f64) {
    let (lon, lat) = point;
    (
        lon.to_radians() * scale * EARTH_RADIUS_KM,
        lat.to_radians() * EARTH_RADIUS_KM,
    )
}

/// Recursive area over the whole geometry union: polygons and
/// multi-polygons contribute their area, features and collections sum
/// their children, everything else contributes zero.
pub fn area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon { coordinates } => polygon_area(coordinates),
        Geometry::MultiPolygon { coordinates } => {
            coordinates.iter().map(|polygon| polygon_area(polygon)).sum()
        }
        Geometry::GeometryCollection { geometries } => geometries.iter().map(area).sum(),
        Geometry::Feature { geometry, .. } => {
            geometry.as_ref().map(|geometry| area(geometry)).unwrap_or(0.0)
        }
        Geometry::FeatureCollection { features } => features.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Total length in kilometers of every line contained in the geometry.
pub fn line_length(geometry: &Geometry) -> f64 {
    let mut lines = Vec::new();
    geometry.collect_lines(&mut lines);
    lines
        .iter()
        .map(|line| {
            let points: Vec<LonLat> = line.iter().filter_map(|p| lonlat(p)).collect();
            path_length(&points)
        })
        .sum()
}

/// Length of a raw coordinate sequence: the sum of consecutive
/// great-circle hops. Zero for fewer than two points.
pub fn path_length(coordinates: &[LonLat]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| distance(pair[0], pair[1]))
        .sum()
}
