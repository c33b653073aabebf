mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use wayside::{
    map::{MapOptions, OpenStreetMapProvider, Viewport},
    vehicles::{HttpVehicleSource, ReconcileSummary, VehicleSource, VehicleTracker},
};

fn status(trip_id: &str, lat: f64) -> serde_json::Value {
    json!({
        "tripId": trip_id,
        "status": {
            "activeTripId": trip_id,
            "vehicleId": format!("v-{trip_id}"),
            "position": {"lat": lat, "lon": -122.33},
            "predicted": true,
            "status": "SCHEDULED"
        }
    })
}

/// Each request moves the route one step: {A, B}, then {B, C}.
fn moving_route() -> Router {
    let polls = Arc::new(AtomicUsize::new(0));
    Router::new().route(
        "/api/oba/trips-for-route/{route_id}",
        get(move || {
            let polls = polls.clone();
            async move {
                let list = match polls.fetch_add(1, Ordering::SeqCst) {
                    0 => vec![status("A", 47.60), status("B", 47.61)],
                    _ => vec![status("B", 47.62), status("C", 47.63)],
                };
                Json(json!({
                    "code": 200,
                    "data": {
                        "list": list,
                        "references": {"trips": [
                            {"id": "A", "routeId": "R"},
                            {"id": "B", "routeId": "R"},
                            {"id": "C", "routeId": "R"}
                        ]}
                    }
                }))
            }
        }),
    )
}

#[tokio::test]
async fn http_source_failure_is_empty_test() {
    let app = Router::new().route(
        "/api/oba/trips-for-route/{route_id}",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
    );
    let source = HttpVehicleSource::new(common::serve(app).await);
    let snapshot = source.fetch_vehicles("R").await;
    assert!(snapshot.list.is_empty());
    assert!(snapshot.references.trips.is_empty());
}

#[tokio::test]
async fn update_vehicle_markers_test() {
    let source = HttpVehicleSource::new(common::serve(moving_route()).await);
    let mut provider = OpenStreetMapProvider::new();
    provider.init_map(MapOptions::new((47.6062, -122.3321).into()));
    let mut tracker = VehicleTracker::new();

    let first = tracker
        .update_vehicle_markers("R", &source, &mut provider)
        .await;
    assert_eq!(first.added, 2);
    let marker_b = *tracker.marker("B").unwrap();

    let second = tracker
        .update_vehicle_markers("R", &source, &mut provider)
        .await;
    assert_eq!(
        second,
        ReconcileSummary {
            added: 1,
            updated: 1,
            removed: 1
        }
    );
    assert_eq!(tracker.marker("B"), Some(&marker_b));
    assert!(tracker.marker("A").is_none());

    let moved = provider.vehicle_marker(marker_b).unwrap();
    assert!((moved.position.latitude - 47.62).abs() < 1e-9);
    assert_eq!(provider.vehicle_markers().count(), 2);

    tracker.clear_markers(&mut provider);
    assert_eq!(provider.vehicle_markers().count(), 0);
    assert_eq!(provider.overlay_count(), 0);
}
