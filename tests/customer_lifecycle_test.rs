mod common;

use std::sync::Arc;
use std::time::Duration;

use ride_sim::channel::mock::MockConnector;
use ride_sim::control::ControlClient;
use ride_sim::customer::CustomerActor;
use ride_sim::movement::GeoPoint;
use ride_sim::protocol::{
    Command, ConfirmTripAck, Envelope, TripRatingPayload, TripRequestPayload,
};

use common::{assert_silent, identity, next_envelope, test_context};

fn ack(trip_id: &str) -> Envelope {
    Envelope::new(
        Command::ConfirmTrip,
        &ConfirmTripAck {
            id: trip_id.to_string(),
        },
    )
    .unwrap()
}

fn completion() -> Envelope {
    Envelope::new(Command::CompleteTrip, &serde_json::json!({})).unwrap()
}

/// Confirming a trip over the control plane emits confirmTrip with the
/// requested route and the default vehicle category.
#[tokio::test]
async fn control_confirm_emits_a_trip_request() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = CustomerActor::spawn(identity("cust-1"), GeoPoint::new(0.0, 0.0), false, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    let response = client
        .confirm_trip(handle.id(), 0.0, 0.0, 0.01, 0.01)
        .await
        .unwrap();
    assert!(response.success);

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::ConfirmTrip);
    let request: TripRequestPayload = envelope.decode().unwrap();
    assert_eq!(request.origin.latitude, 0.0);
    assert_eq!(request.destination.latitude, 0.01);
    assert_eq!(request.vehicle_category_id, Some(1));

    handle.shutdown().await;
}

/// The confirm acknowledgment carries the trip id; the later completion
/// command produces exactly one driver rating for that id, with a rating
/// in `[0, 5)`. A non-looping customer then goes quiet.
#[tokio::test]
async fn completion_rates_the_driver_once() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = CustomerActor::spawn(identity("cust-2"), GeoPoint::new(0.0, 0.0), false, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    client
        .confirm_trip(handle.id(), 0.0, 0.0, 0.01, 0.01)
        .await
        .unwrap();
    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::ConfirmTrip);

    probe.feed(&ack("T1"));
    probe.feed(&completion());

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::RateDriver);
    let rating: TripRatingPayload = envelope.decode().unwrap();
    assert_eq!(rating.trip_id, "T1");
    assert!((0.0..5.0).contains(&rating.rating));

    assert_silent(&mut probe, Duration::from_millis(200)).await;

    handle.shutdown().await;
}

/// A looping customer rides back after completion: following the driver
/// rating it confirms a new trip with origin and destination swapped.
#[tokio::test]
async fn looping_customer_confirms_the_return_trip() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = CustomerActor::spawn(identity("cust-3"), GeoPoint::new(0.0, 0.0), true, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    client
        .confirm_trip(handle.id(), 0.0, 0.0, 0.01, 0.02)
        .await
        .unwrap();
    let outbound = next_envelope(&mut probe).await;
    assert_eq!(outbound.command, Command::ConfirmTrip);

    probe.feed(&ack("T1"));
    probe.feed(&completion());

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::RateDriver);

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::ConfirmTrip);
    let request: TripRequestPayload = envelope.decode().unwrap();
    assert_eq!(request.origin.latitude, 0.01);
    assert_eq!(request.origin.longitude, 0.02);
    assert_eq!(request.destination.latitude, 0.0);
    assert_eq!(request.destination.longitude, 0.0);

    handle.shutdown().await;
}

/// A completion that arrives before any trip was confirmed produces no
/// rating at all.
#[tokio::test]
async fn completion_without_a_trip_is_ignored() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = CustomerActor::spawn(identity("cust-4"), GeoPoint::new(0.0, 0.0), false, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    probe.feed(&completion());
    assert_silent(&mut probe, Duration::from_millis(200)).await;

    handle.shutdown().await;
}

/// An estimate request goes out without a vehicle category, and the
/// backend's echo is absorbed without any outbound reaction.
#[tokio::test]
async fn estimate_request_has_no_category() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = CustomerActor::spawn(identity("cust-5"), GeoPoint::new(0.0, 0.0), false, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    let response = client
        .trip_estimate(handle.id(), 0.0, 0.0, 0.01, 0.01)
        .await
        .unwrap();
    assert!(response.success);

    let envelope = next_envelope(&mut probe).await;
    assert_eq!(envelope.command, Command::RequestEstimate);
    let request: TripRequestPayload = envelope.decode().unwrap();
    assert_eq!(request.vehicle_category_id, None);

    probe.feed(
        &Envelope::new(
            Command::RequestEstimate,
            &serde_json::json!({"fare": 12.5}),
        )
        .unwrap(),
    );
    assert_silent(&mut probe, Duration::from_millis(200)).await;

    handle.shutdown().await;
}
