//! End-to-end planning tests against a mock routing service.

use chrono::{TimeZone, Utc};

use tour_planner::geo;
use tour_planner::geojson::{Geometry, LonLat};
use tour_planner::model::{Client, PlanOptions, PlanRequest};
use tour_planner::planner::plan_tours;
use tour_planner::service::{MatrixResponse, RoutingService, ServiceError};
use tour_planner::tour::CAPACITY_EPS;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Well-behaved service: haversine-true matrix (meters/seconds at 50 km/h),
/// generous isochrone boxes, and route geometry through the waypoints.
struct MockService;

impl RoutingService for MockService {
    fn matrix(&self, _profile: &str, locations: &[LonLat]) -> Result<MatrixResponse, ServiceError> {
        let n = locations.len();
        let distances = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| Some(geo::distance(locations[i], locations[j]) * 1000.0))
                    .collect()
            })
            .collect();
        let durations = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| Some(geo::distance(locations[i], locations[j]) / 50.0 * 3600.0))
                    .collect()
            })
            .collect();
        Ok(MatrixResponse {
            distances: Some(distances),
            durations: Some(durations),
        })
    }

    fn isochrone(
        &self,
        _profile: &str,
        location: LonLat,
        _range_seconds: f64,
    ) -> Result<Geometry, ServiceError> {
        let (lon, lat) = location;
        Ok(Geometry::Polygon {
            coordinates: vec![vec![
                vec![lon - 0.5, lat - 0.5],
                vec![lon + 0.5, lat - 0.5],
                vec![lon + 0.5, lat + 0.5],
                vec![lon - 0.5, lat + 0.5],
                vec![lon - 0.5, lat - 0.5],
            ]],
        })
    }

    fn directions(&self, _profile: &str, coordinates: &[LonLat]) -> Result<Geometry, ServiceError> {
        Ok(Geometry::LineString {
            coordinates: coordinates.iter().map(|(lon, lat)| vec![*lon, *lat]).collect(),
        })
    }
}

fn client(name: &str, lon: f64, lat: f64, weight: f64, urgent: bool) -> Client {
    Client {
        id: Some(name.to_string()),
        name: name.to_string(),
        location: (lon, lat),
        weight_kg: weight,
        order_date: "2026-08-01T08:00:00Z".to_string(),
        urgent,
    }
}

fn options() -> PlanOptions {
    PlanOptions {
        reference_time: Some(Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap()),
        ..PlanOptions::default()
    }
}

fn paris_request(capacity: f64, desired: usize) -> PlanRequest {
    PlanRequest {
        depot: (2.0, 48.0),
        clients: vec![
            client("c1", 2.1, 48.1, 600.0, false),
            client("c2", 2.15, 48.11, 700.0, true),
            client("c3", 2.05, 48.08, 200.0, false),
        ],
        truck_capacity_kg: capacity,
        desired_tour_count: desired,
        options: options(),
    }
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn single_tour_visits_urgent_seed_first() {
    let result = plan_tours(&MockService, &paris_request(1600.0, 1)).unwrap();

    assert_eq!(result.tours.len(), 1);
    let tour = &result.tours[0];
    let ids: Vec<&str> = tour.stops.iter().map(|s| s.client.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1", "c3"]);
    assert_eq!(tour.total_weight_kg, 1500.0);
    assert!(result.unassigned.is_empty());
    assert!(result.warnings.is_empty(), "got warnings: {:?}", result.warnings);
    assert!(tour.warnings.is_empty());
    assert!(tour.geometry.is_some());
    assert!(tour.stops[0].client.is_seed);
}

#[test]
fn stop_positions_are_one_based_and_sequential() {
    let result = plan_tours(&MockService, &paris_request(1600.0, 1)).unwrap();
    let positions: Vec<usize> = result.tours[0].stops.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[test]
fn tour_totals_sum_matrix_legs() {
    let result = plan_tours(&MockService, &paris_request(1600.0, 1)).unwrap();
    let tour = &result.tours[0];

    // depot -> c2 -> c1 -> c3 -> depot, all haversine in the mock.
    let legs = [
        ((2.0, 48.0), (2.15, 48.11)),
        ((2.15, 48.11), (2.1, 48.1)),
        ((2.1, 48.1), (2.05, 48.08)),
        ((2.05, 48.08), (2.0, 48.0)),
    ];
    let expected_km: f64 = legs.iter().map(|(a, b)| geo::distance(*a, *b)).sum();
    assert!((tour.total_distance_km - expected_km).abs() < 1e-6);
    let expected_min = expected_km / 50.0 * 60.0;
    assert!((tour.total_duration_min - expected_min).abs() < 1e-6);
}

#[test]
fn desired_tour_count_clamped_to_vehicle_limit() {
    let result = plan_tours(&MockService, &paris_request(1600.0, 5)).unwrap();

    assert!(result.tours.len() <= 3);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("limit") && w.contains('3')),
        "expected a clamp warning, got {:?}",
        result.warnings
    );
}

#[test]
fn capacity_invariant_holds_for_every_tour() {
    let mut request = paris_request(900.0, 3);
    request.clients.push(client("c4", 2.2, 48.05, 500.0, false));
    request.clients.push(client("c5", 2.02, 48.02, 450.0, false));

    let result = plan_tours(&MockService, &request).unwrap();
    for tour in &result.tours {
        let stop_sum: f64 = tour.stops.iter().map(|s| s.client.weight_kg).sum();
        assert!(stop_sum <= 900.0 + CAPACITY_EPS, "tour {} overweight", tour.id);
        assert!((stop_sum - tour.total_weight_kg).abs() < 1e-9);
    }
}

#[test]
fn every_client_lands_in_exactly_one_place() {
    let mut request = paris_request(900.0, 2);
    request.clients.push(client("c4", 2.2, 48.05, 500.0, false));
    request.clients.push(client("c5", 2.02, 48.02, 450.0, false));
    request.clients.push(client("c6", 2.3, 48.2, 800.0, false));

    let result = plan_tours(&MockService, &request).unwrap();

    let mut seen: Vec<&str> = Vec::new();
    for tour in &result.tours {
        for stop in &tour.stops {
            seen.push(stop.client.id.as_str());
        }
    }
    for unassigned in &result.unassigned {
        seen.push(unassigned.id.as_str());
    }

    seen.sort();
    let expected = {
        let mut ids: Vec<&str> = request.clients.iter().map(|c| c.id.as_deref().unwrap()).collect();
        ids.sort();
        ids
    };
    assert_eq!(seen, expected, "each client must appear exactly once");
}

#[test]
fn overweight_client_is_never_routed_and_warned_about() {
    let mut request = paris_request(1600.0, 1);
    request.clients.push(client("heavy", 2.12, 48.09, 2500.0, false));

    let result = plan_tours(&MockService, &request).unwrap();

    assert!(result.unassigned.iter().any(|c| c.id == "heavy"));
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("heavy") && w.contains("exceeds the truck capacity")),
        "got {:?}",
        result.warnings
    );
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("could not be assigned")),
        "expected an unassigned summary, got {:?}",
        result.warnings
    );
}

#[test]
fn result_echoes_weights_and_reference_time() {
    let request = paris_request(1600.0, 1);
    let result = plan_tours(&MockService, &request).unwrap();
    assert_eq!(result.weights, request.options.weights);
    assert_eq!(
        result.reference_time,
        request.options.reference_time.unwrap()
    );
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn rejects_empty_client_list() {
    let mut request = paris_request(1600.0, 1);
    request.clients.clear();
    assert!(matches!(
        plan_tours(&MockService, &request),
        Err(tour_planner::error::PlanError::NoClients)
    ));
}

#[test]
fn rejects_non_positive_capacity() {
    let request = paris_request(0.0, 1);
    assert!(matches!(
        plan_tours(&MockService, &request),
        Err(tour_planner::error::PlanError::InvalidCapacity(_))
    ));
}

#[test]
fn rejects_zero_tour_count() {
    let request = paris_request(1600.0, 0);
    assert!(matches!(
        plan_tours(&MockService, &request),
        Err(tour_planner::error::PlanError::InvalidTourCount)
    ));
}

#[test]
fn rejects_malformed_depot() {
    let mut request = paris_request(1600.0, 1);
    request.depot = (f64::NAN, 48.0);
    assert!(matches!(
        plan_tours(&MockService, &request),
        Err(tour_planner::error::PlanError::InvalidCoordinate { .. })
    ));
}

#[test]
fn rejects_unparseable_order_date() {
    let mut request = paris_request(1600.0, 1);
    request.clients[0].order_date = "soonish".to_string();
    assert!(matches!(
        plan_tours(&MockService, &request),
        Err(tour_planner::error::PlanError::InvalidOrderDate(_))
    ));
}
