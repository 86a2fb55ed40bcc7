//! Closed GeoJSON-like geometry model.
//!
//! Remote responses (isochrones, route geometries) arrive as polymorphic
//! GeoJSON unions. We model them as a closed set of variants dispatched by
//! the `type` tag and walk them with recursive descent; anything the
//! planner does not understand simply contributes nothing.

use serde::{Deserialize, Serialize};

/// A (longitude, latitude) pair. All planner coordinates use this order.
pub type LonLat = (f64, f64);

/// A raw GeoJSON position: `[lon, lat]`, possibly with a trailing elevation.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
    Feature {
        geometry: Option<Box<Geometry>>,
        #[serde(default)]
        properties: serde_json::Value,
    },
    FeatureCollection {
        features: Vec<Geometry>,
    },
}

/// Parses a raw position into a usable (lon, lat) pair.
///
/// Returns `None` for positions with fewer than two components or with
/// non-finite values; callers skip such positions rather than failing.
pub fn lonlat(position: &[f64]) -> Option<LonLat> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some((*lon, *lat)),
        _ => None,
    }
}

/// Whether a pair of finite numbers looks like a coordinate at all.
pub fn is_valid_lonlat(point: LonLat) -> bool {
    point.0.is_finite() && point.1.is_finite()
}

impl Geometry {
    /// Collects every line (as a raw position sequence) reachable from this
    /// geometry, descending through features and collections. Terminates at
    /// LineString/MultiLineString; other leaf types contribute nothing.
    pub fn collect_lines<'a>(&'a self, out: &mut Vec<&'a [Position]>) {
        match self {
            Geometry::LineString { coordinates } => out.push(coordinates),
            Geometry::MultiLineString { coordinates } => {
                for line in coordinates {
                    out.push(line);
                }
            }
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_lines(out);
                }
            }
            Geometry::Feature { geometry, .. } => {
                if let Some(geometry) = geometry {
                    geometry.collect_lines(out);
                }
            }
            Geometry::FeatureCollection { features } => {
                for feature in features {
                    feature.collect_lines(out);
                }
            }
            _ => {}
        }
    }

    /// Point-in-area test, descending through features and collections.
    ///
    /// A polygon contains the point when its outer ring does and no hole
    /// ring does. Non-areal leaf geometries never contain anything.
    pub fn contains_point(&self, point: LonLat) -> bool {
        match self {
            Geometry::Polygon { coordinates } => polygon_contains(coordinates, point),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|polygon| polygon_contains(polygon, point)),
            Geometry::GeometryCollection { geometries } => geometries
                .iter()
                .any(|geometry| geometry.contains_point(point)),
            Geometry::Feature { geometry, .. } => geometry
                .as_ref()
                .is_some_and(|geometry| geometry.contains_point(point)),
            Geometry::FeatureCollection { features } => features
                .iter()
                .any(|feature| feature.contains_point(point)),
            _ => false,
        }
    }
}

fn polygon_contains(rings: &[Vec<Position>], point: LonLat) -> bool {
    let Some(outer) = rings.first() else {
        return false;
    };
    if !ring_contains(outer, point) {
        return false;
    }
    !rings[1..].iter().any(|hole| ring_contains(hole, point))
}

/// Even-odd ray casting on a lon/lat ring. Malformed vertices are skipped.
fn ring_contains(ring: &[Position], point: LonLat) -> bool {
    let vertices: Vec<LonLat> = ring.iter().filter_map(|p| lonlat(p)).collect();
    if vertices.len() < 3 {
        return false;
    }

    let (px, py) = point;
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
