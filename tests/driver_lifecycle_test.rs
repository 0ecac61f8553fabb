mod common;

use std::sync::Arc;
use std::time::Duration;

use ride_sim::channel::mock::MockConnector;
use ride_sim::control::ControlClient;
use ride_sim::driver::DriverActor;
use ride_sim::movement::GeoPoint;
use ride_sim::protocol::{
    Command, DriverLocationPayload, EncodedPolyline, Envelope, Route, RouteEstimate,
    TripActionPayload, TripOffer, TripOfferPayload, TripRatingPayload, TripRoute,
};

use common::{identity, next_envelope, next_non_location, test_context};

/// Reference polyline decoding to (38.5, -120.2), (40.7, -120.95),
/// (43.252, -126.453).
const ROUTE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

fn offer(trip_id: &str) -> Envelope {
    let payload = TripOfferPayload {
        trip_offer: TripOffer {
            trip_id: trip_id.to_string(),
            trip: TripRoute {
                origin_lat: 38.5,
                origin_lng: -120.2,
                destination_lat: 43.252,
                destination_lng: -126.453,
            },
        },
        pickup_estimate: RouteEstimate {
            route: Route {
                polyline: EncodedPolyline {
                    encoded: ROUTE.to_string(),
                },
            },
        },
        trip_estimate: RouteEstimate {
            route: Route {
                polyline: EncodedPolyline {
                    encoded: ROUTE.to_string(),
                },
            },
        },
    };
    Envelope::new(Command::NewTripOffer, &payload).unwrap()
}

/// A driver with acceptance rate 1.0 carries an offer through the full
/// lifecycle: acceptTrip, arrivedForPickup, startTrip, completeTrip, in
/// that order, all addressed to the offer's trip id. Location pings
/// interleave freely and are skipped by the probe.
#[tokio::test]
async fn accepted_offer_runs_the_full_trip_lifecycle() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = DriverActor::spawn(identity("driver-1"), GeoPoint::new(0.0, 0.0), 1.0, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    probe.feed(&offer("T2"));

    for expected in [
        Command::AcceptTrip,
        Command::ArrivedForPickup,
        Command::StartTrip,
        Command::CompleteTrip,
    ] {
        let envelope = next_non_location(&mut probe).await;
        assert_eq!(envelope.command, expected);
        let action: TripActionPayload = envelope.decode().unwrap();
        assert_eq!(action.trip_id, "T2");
    }

    handle.shutdown().await;
}

/// An inbound trip-completion command makes the driver rate the customer
/// on the active trip with a rating in `[0, 5)`.
#[tokio::test]
async fn trip_completion_triggers_a_customer_rating() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = DriverActor::spawn(identity("driver-2"), GeoPoint::new(0.0, 0.0), 1.0, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    probe.feed(&offer("T2"));
    loop {
        let envelope = next_non_location(&mut probe).await;
        if envelope.command == Command::CompleteTrip {
            break;
        }
    }

    // Backend confirms the completion back to the driver.
    probe.feed(
        &Envelope::new(
            Command::CompleteTrip,
            &TripActionPayload {
                trip_id: "T2".to_string(),
            },
        )
        .unwrap(),
    );

    let envelope = next_non_location(&mut probe).await;
    assert_eq!(envelope.command, Command::RateCustomer);
    let rating: TripRatingPayload = envelope.decode().unwrap();
    assert_eq!(rating.trip_id, "T2");
    assert!((0.0..5.0).contains(&rating.rating));

    handle.shutdown().await;
}

/// A driver with acceptance rate 0.0 answers every offer with rejectTrip
/// and never advances the trip.
#[tokio::test]
async fn zero_acceptance_rate_rejects_the_offer() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = DriverActor::spawn(identity("driver-3"), GeoPoint::new(0.0, 0.0), 0.0, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    probe.feed(&offer("T9"));

    let envelope = next_non_location(&mut probe).await;
    assert_eq!(envelope.command, Command::RejectTrip);
    let action: TripActionPayload = envelope.decode().unwrap();
    assert_eq!(action.trip_id, "T9");

    handle.shutdown().await;
}

/// An offer whose payload does not decode is dropped with no reply at
/// all; the next well-formed offer still goes through.
#[tokio::test]
async fn unreadable_offer_gets_no_reply() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = DriverActor::spawn(identity("driver-4"), GeoPoint::new(0.0, 0.0), 0.0, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    probe
        .inbound
        .send(r#"{"command":"newTripOffer","payload":{"garbage":true}}"#.to_string())
        .unwrap();
    probe.feed(&offer("T5"));

    // First trip-flow command seen is the reject for T5, so the broken
    // offer produced neither an accept nor a reject.
    let envelope = next_non_location(&mut probe).await;
    assert_eq!(envelope.command, Command::RejectTrip);
    let action: TripActionPayload = envelope.decode().unwrap();
    assert_eq!(action.trip_id, "T5");

    handle.shutdown().await;
}

/// The ping loop broadcasts the driver's current position; a SetLocation
/// control call moves the driver and the new coordinates show up in the
/// location stream.
#[tokio::test]
async fn set_location_is_reflected_in_location_updates() {
    let connector = Arc::new(MockConnector::new());
    let ctx = test_context(connector.clone());
    let client = ControlClient::new(ctx.registry.clone());

    let handle = DriverActor::spawn(identity("driver-5"), GeoPoint::new(1.0, 2.0), 1.0, ctx)
        .await
        .unwrap();
    let mut probe = connector.push_channel();
    assert!(client.init_connection(handle.id()).await.unwrap().success);

    let response = client.set_location(handle.id(), 10.0, 20.0).await.unwrap();
    assert!(response.success);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        assert!(tokio::time::Instant::now() < deadline, "no update at the new position");
        let envelope = next_envelope(&mut probe).await;
        if envelope.command != Command::DriverLocation {
            continue;
        }
        let update: DriverLocationPayload = envelope.decode().unwrap();
        let coords = update.raw_location.coordinates;
        if coords.latitude == 10.0 && coords.longitude == 20.0 {
            break;
        }
    }

    handle.shutdown().await;
}
