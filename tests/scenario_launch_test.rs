mod common;

use std::sync::Arc;

use ride_sim::channel::mock::MockConnector;
use ride_sim::movement::{distance_m, GeoPoint};
use ride_sim::protocol::{Command, TripRequestPayload};
use ride_sim::scenario::{self, Scenario};

use common::{next_envelope, test_context};

fn scenario(num_drivers: u32, num_customers: u32) -> Scenario {
    serde_json::from_value(serde_json::json!({
        "num_drivers": num_drivers,
        "num_customers": num_customers,
        "center_lat": 52.52,
        "center_lng": 13.405,
        "radius": 2.0,
        "acceptance_rate": 1.0,
    }))
    .unwrap()
}

/// A customer-only scenario brings the customer fully up: login, channel,
/// and an initial trip confirmation whose origin lies inside the scenario
/// radius and whose destination lies inside four times the radius.
#[tokio::test]
async fn customer_bring_up_confirms_an_initial_trip() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let mut probe = connector.push_channel();

    let handle = scenario::launch(&scenario(0, 1), &ctx).await;
    assert_eq!(handle.len(), 1);

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::ConfirmTrip);
    let request: TripRequestPayload = envelope.decode().unwrap();

    let center = GeoPoint::new(52.52, 13.405);
    assert!(distance_m(center, request.origin.into()) <= 2_000.0 * 1.01);
    assert!(distance_m(center, request.destination.into()) <= 8_000.0 * 1.01);

    handle.shutdown().await;
}

/// A driver-only scenario logs the driver in, takes it online, and opens
/// its channel; the ping loop then broadcasts its spawn position.
#[tokio::test]
async fn driver_bring_up_starts_location_pings() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let mut probe = connector.push_channel();

    let handle = scenario::launch(&scenario(1, 0), &ctx).await;
    assert_eq!(handle.len(), 1);

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::DriverLocation);

    handle.shutdown().await;
}

/// Bring-up failures abandon the affected actor but never the scenario:
/// with no mock channel queued, the customer's channel dial fails yet a
/// handle still comes back and the actor remains addressable.
#[tokio::test]
async fn scenario_survives_partial_bring_up() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector);

    let handle = scenario::launch(&scenario(0, 1), &ctx).await;
    assert_eq!(handle.len(), 1);

    let id = handle.actors()[0].id().to_string();
    assert!(ctx.registry.get(&id).await.unwrap().is_some());

    handle.shutdown().await;
}

/// An empty scenario launches no actors and shuts down cleanly.
#[tokio::test]
async fn empty_scenario_is_a_no_op() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector);

    let handle = scenario::launch(&scenario(0, 0), &ctx).await;
    assert!(handle.is_empty());
    handle.shutdown().await;
}
