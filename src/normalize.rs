//! Client normalization.
//!
//! Validates raw client input and enriches it into `NormalizedClient`
//! records with matrix indices, order ages, and straight-line depot
//! metrics. Pure with respect to its input; fails fast on malformed
//! coordinates or unparseable order dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::PlanError;
use crate::geo;
use crate::geojson::{is_valid_lonlat, LonLat};
use crate::model::{Client, NormalizedClient};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Normalizes raw clients against a depot and reference instant.
///
/// Matrix indices are assigned sequentially in input order starting at 1;
/// index 0 is reserved for the depot. Identifiers default to
/// `client-<index>` when absent.
pub fn normalize_clients(
    clients: &[Client],
    depot: LonLat,
    reference: DateTime<Utc>,
    average_speed_kmh: f64,
) -> Result<Vec<NormalizedClient>, PlanError> {
    clients
        .iter()
        .enumerate()
        .map(|(i, client)| normalize_one(client, i, depot, reference, average_speed_kmh))
        .collect()
}

fn normalize_one(
    client: &Client,
    index: usize,
    depot: LonLat,
    reference: DateTime<Utc>,
    average_speed_kmh: f64,
) -> Result<NormalizedClient, PlanError> {
    if !is_valid_lonlat(client.location) {
        return Err(PlanError::InvalidCoordinate {
            context: format!("client `{}`", client.name),
        });
    }

    let order_date = parse_order_date(&client.order_date)
        .ok_or_else(|| PlanError::InvalidOrderDate(client.order_date.clone()))?;

    let age_days =
        ((reference - order_date).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);

    let depot_distance_km = geo::distance(depot, client.location);
    let depot_duration_min = depot_distance_km / average_speed_kmh * 60.0;

    Ok(NormalizedClient {
        id: client
            .id
            .clone()
            .unwrap_or_else(|| format!("client-{}", index + 1)),
        name: client.name.clone(),
        location: client.location,
        weight_kg: client.weight_kg,
        urgent: client.urgent,
        order_date,
        age_days,
        depot_distance_km,
        depot_duration_min,
        matrix_index: index + 1,
        neighbor_count: 0,
        score: 0.0,
        is_seed: false,
    })
}

/// Parses an order timestamp: RFC 3339 first, then `YYYY-MM-DD HH:MM:SS`,
/// then a bare `YYYY-MM-DD` (taken as midnight). Naive forms are read as
/// UTC.
fn parse_order_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(parsed.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()
    }

    fn raw_client(name: &str) -> Client {
        Client {
            id: None,
            name: name.to_string(),
            location: (2.1, 48.1),
            weight_kg: 500.0,
            order_date: "2026-08-08T12:00:00Z".to_string(),
            urgent: false,
        }
    }

    #[test]
    fn test_assigns_sequential_matrix_indices_and_default_ids() {
        let clients = vec![raw_client("a"), raw_client("b")];
        let normalized =
            normalize_clients(&clients, (2.0, 48.0), reference(), 50.0).unwrap();
        assert_eq!(normalized[0].matrix_index, 1);
        assert_eq!(normalized[1].matrix_index, 2);
        assert_eq!(normalized[0].id, "client-1");
        assert_eq!(normalized[1].id, "client-2");
    }

    #[test]
    fn test_keeps_supplied_id() {
        let mut client = raw_client("a");
        client.id = Some("ACME-7".to_string());
        let normalized =
            normalize_clients(&[client], (2.0, 48.0), reference(), 50.0).unwrap();
        assert_eq!(normalized[0].id, "ACME-7");
    }

    #[test]
    fn test_age_in_days() {
        let normalized =
            normalize_clients(&[raw_client("a")], (2.0, 48.0), reference(), 50.0).unwrap();
        assert!((normalized[0].age_days - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_future_order_age_floors_at_zero() {
        let mut client = raw_client("a");
        client.order_date = "2026-09-01T00:00:00Z".to_string();
        let normalized =
            normalize_clients(&[client], (2.0, 48.0), reference(), 50.0).unwrap();
        assert_eq!(normalized[0].age_days, 0.0);
    }

    #[test]
    fn test_depot_metrics_use_straight_line_estimate() {
        let normalized =
            normalize_clients(&[raw_client("a")], (2.0, 48.0), reference(), 50.0).unwrap();
        let expected = geo::distance((2.0, 48.0), (2.1, 48.1));
        assert!((normalized[0].depot_distance_km - expected).abs() < 1e-9);
        let expected_min = expected / 50.0 * 60.0;
        assert!((normalized[0].depot_duration_min - expected_min).abs() < 1e-9);
    }

    #[test]
    fn test_accepts_naive_and_date_only_forms() {
        for raw in ["2026-08-08 09:30:00", "2026-08-08"] {
            let mut client = raw_client("a");
            client.order_date = raw.to_string();
            assert!(
                normalize_clients(&[client], (2.0, 48.0), reference(), 50.0).is_ok(),
                "should parse `{raw}`"
            );
        }
    }

    #[test]
    fn test_rejects_bad_coordinate() {
        let mut client = raw_client("a");
        client.location = (f64::INFINITY, 48.1);
        assert!(matches!(
            normalize_clients(&[client], (2.0, 48.0), reference(), 50.0),
            Err(PlanError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_order_date() {
        let mut client = raw_client("a");
        client.order_date = "next tuesday".to_string();
        assert!(matches!(
            normalize_clients(&[client], (2.0, 48.0), reference(), 50.0),
            Err(PlanError::InvalidOrderDate(_))
        ));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let clients = vec![raw_client("a"), raw_client("b")];
        let first = normalize_clients(&clients, (2.0, 48.0), reference(), 50.0).unwrap();
        let second = normalize_clients(&clients, (2.0, 48.0), reference(), 50.0).unwrap();
        assert_eq!(first, second);
    }
}
