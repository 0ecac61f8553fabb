//! # Driver Actor
//!
//! One [`DriverActor`] per simulated driver. The trip lifecycle it walks:
//!
//! `Created → Online → Connected → WaitingForOffer → OfferEvaluated →
//! ArrivingAtPickup → Arrived → TripInProgress → TripCompleted → WaitingForOffer`
//!
//! `GoOnline` and `InitConnection` arrive over the control plane; the rest
//! of the machine advances from inbound channel commands. Once connected,
//! a periodic ping task broadcasts the driver's position independently of
//! trip state. The actor is reusable across trips within one process
//! lifetime: completing a trip returns it to waiting for the next offer.
//!
//! # Concurrency
//!
//! The actor's position is the only state shared between tasks (control
//! calls, the ping loop, route replay); it sits behind a short-lived lock.
//! Trip context is written by the dispatcher alone. All outbound sends go
//! through the channel sink, which serializes writers internally.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::channel::ChannelSink;
use crate::control::{ControlHandler, ControlRequest, ControlResponse, ControlServer};
use crate::dispatcher::{self, CommandHandler};
use crate::error::SimError;
use crate::lifecycle::{new_task_set, ActorHandle, SimContext, TaskSet};
use crate::model::{sample_rating, Identity};
use crate::movement::{decode_polyline, GeoPoint};
use crate::protocol::{
    Command, DriverLocationPayload, Envelope, RawLocation, TripActionPayload, TripOfferPayload,
    TripRatingPayload,
};

const CHANNEL_PATH: &str = "/ws/driver";
/// Vehicle category reported with periodic location pings.
const VEHICLE_CATEGORY: u32 = 2;

/// Draws one uniform value in `[0, 1)` and accepts iff it is strictly
/// below `acceptance_rate`.
pub fn should_accept(acceptance_rate: f64) -> bool {
    rand::thread_rng().gen::<f64>() < acceptance_rate
}

/// Trip context retained from the most recent offer. Replaced wholesale
/// when the next offer arrives.
#[derive(Debug, Clone)]
struct ActiveTrip {
    id: String,
}

pub struct DriverActor {
    identity: Identity,
    acceptance_rate: f64,
    position: Mutex<GeoPoint>,
    trip: Mutex<Option<ActiveTrip>>,
    sink: Mutex<Option<Arc<dyn ChannelSink>>>,
    tasks: TaskSet,
    ctx: SimContext,
}

impl DriverActor {
    /// Creates the actor, binds its control endpoint, and registers it.
    /// The realtime channel is not opened until `InitConnection` arrives.
    pub async fn spawn(
        identity: Identity,
        start: GeoPoint,
        acceptance_rate: f64,
        ctx: SimContext,
    ) -> Result<ActorHandle, SimError> {
        let id = identity.id.clone();
        let tasks = new_task_set();
        let registry = ctx.registry.clone();

        let actor = Arc::new(Self {
            identity,
            acceptance_rate,
            position: Mutex::new(start),
            trip: Mutex::new(None),
            sink: Mutex::new(None),
            tasks: tasks.clone(),
            ctx,
        });

        let handler: Arc<dyn ControlHandler> = actor;
        let server = ControlServer::bind(&id, handler, registry.as_ref()).await?;
        info!(actor_id = %id, address = server.address(), "driver actor spawned");
        Ok(ActorHandle::new(id, server, tasks, registry))
    }

    // --- Control operations ---

    async fn init_connection(self: &Arc<Self>) -> ControlResponse {
        let connect = self
            .ctx
            .connector
            .connect(CHANNEL_PATH, &self.identity.access_token)
            .await;
        let (sink, stream) = match connect {
            Ok(halves) => halves,
            Err(e) => {
                warn!(actor_id = %self.identity.id, error = %e, "realtime channel dial failed");
                return ControlResponse::fail(e.to_string());
            }
        };
        *self.sink.lock().expect("sink lock poisoned") = Some(sink);

        let commands: Arc<dyn CommandHandler> = self.clone();
        let read_loop = tokio::spawn(dispatcher::run(stream, commands, self.identity.id.clone()));
        let ping_loop = tokio::spawn(self.clone().ping_location_loop());
        self.tasks
            .lock()
            .expect("task set lock poisoned")
            .extend([read_loop, ping_loop]);

        info!(actor_id = %self.identity.id, "realtime channel connected");
        ControlResponse::ok()
    }

    async fn set_location(&self, point: GeoPoint) -> ControlResponse {
        *self.position.lock().expect("position lock poisoned") = point;
        match self.send_location(point, None).await {
            Ok(()) => ControlResponse::ok(),
            Err(e) => {
                warn!(actor_id = %self.identity.id, error = %e, "location update failed");
                ControlResponse::fail(e.to_string())
            }
        }
    }

    /// Ends in an "online" state or reports why not: an already-active
    /// shift counts, otherwise a new shift is requested.
    async fn go_online(&self) -> ControlResponse {
        let token = &self.identity.access_token;
        match self.ctx.backend.shift_status(token).await {
            Ok(true) => return ControlResponse::ok(),
            Ok(false) => {}
            Err(e) => return ControlResponse::fail(e.to_string()),
        }
        match self.ctx.backend.start_shift(token).await {
            Ok(true) => ControlResponse::ok(),
            Ok(false) => ControlResponse::fail("backend did not start a shift"),
            Err(e) => ControlResponse::fail(e.to_string()),
        }
    }

    // --- Channel handlers ---

    async fn on_trip_offer(&self, envelope: &Envelope) {
        // Edge policy: an offer we cannot read gets no accept/reject at all.
        let offer: TripOfferPayload = match envelope.decode() {
            Ok(offer) => offer,
            Err(e) => {
                warn!(actor_id = %self.identity.id, error = %e, "dropping unreadable trip offer");
                return;
            }
        };
        let trip_id = offer.trip_offer.trip_id.clone();
        *self.trip.lock().expect("trip lock poisoned") = Some(ActiveTrip {
            id: trip_id.clone(),
        });

        let outcome = if should_accept(self.acceptance_rate) {
            info!(actor_id = %self.identity.id, trip_id, "accepting trip offer");
            self.run_trip(&offer).await
        } else {
            info!(actor_id = %self.identity.id, trip_id, "rejecting trip offer");
            self.send_action(Command::RejectTrip, &trip_id).await
        };
        if let Err(e) = outcome {
            warn!(actor_id = %self.identity.id, trip_id, error = %e, "trip flow aborted");
        }
    }

    /// Drives an accepted trip through to `completeTrip`: replay the pickup
    /// route, snap to the origin, arrive; then start, replay the drop-off
    /// route, snap to the destination, complete.
    async fn run_trip(&self, offer: &TripOfferPayload) -> Result<(), SimError> {
        let trip_id = &offer.trip_offer.trip_id;
        let trip = &offer.trip_offer.trip;
        let timing = self.ctx.timing;

        self.send_action(Command::AcceptTrip, trip_id).await?;

        sleep(timing.before_arrival).await;
        self.replay_route(&offer.pickup_estimate.route.polyline.encoded)
            .await?;
        self.move_to(GeoPoint::new(trip.origin_lat, trip.origin_lng))
            .await?;
        self.send_action(Command::ArrivedForPickup, trip_id).await?;

        sleep(timing.before_start_trip).await;
        self.send_action(Command::StartTrip, trip_id).await?;
        self.replay_route(&offer.trip_estimate.route.polyline.encoded)
            .await?;
        self.move_to(GeoPoint::new(trip.destination_lat, trip.destination_lng))
            .await?;

        sleep(timing.before_complete_trip).await;
        self.send_action(Command::CompleteTrip, trip_id).await
    }

    async fn on_trip_completed(&self) {
        let trip_id = self
            .trip
            .lock()
            .expect("trip lock poisoned")
            .as_ref()
            .map(|trip| trip.id.clone());
        let Some(trip_id) = trip_id else {
            warn!(actor_id = %self.identity.id, "trip completion without an active trip");
            return;
        };

        let payload = TripRatingPayload {
            trip_id: trip_id.clone(),
            rating: sample_rating(),
        };
        info!(actor_id = %self.identity.id, trip_id, rating = payload.rating, "rating customer");
        if let Err(e) = self.send(Command::RateCustomer, &payload).await {
            warn!(actor_id = %self.identity.id, error = %e, "customer rating failed");
        }
        // Back to waiting for the next offer.
    }

    // --- Movement ---

    /// Walks the encoded route coordinate by coordinate, one location ping
    /// per coordinate at the fixed pacing interval.
    async fn replay_route(&self, encoded: &str) -> Result<(), SimError> {
        for point in decode_polyline(encoded) {
            self.move_to(point).await?;
            sleep(self.ctx.timing.route_ping).await;
        }
        Ok(())
    }

    async fn move_to(&self, point: GeoPoint) -> Result<(), SimError> {
        *self.position.lock().expect("position lock poisoned") = point;
        self.send_location(point, Some(VEHICLE_CATEGORY)).await
    }

    async fn ping_location_loop(self: Arc<Self>) {
        loop {
            let position = *self.position.lock().expect("position lock poisoned");
            if let Err(e) = self.send_location(position, Some(VEHICLE_CATEGORY)).await {
                warn!(actor_id = %self.identity.id, error = %e, "location ping failed, stopping");
                return;
            }
            sleep(self.ctx.timing.location_ping).await;
        }
    }

    // --- Outbound helpers ---

    fn sink(&self) -> Result<Arc<dyn ChannelSink>, SimError> {
        self.sink
            .lock()
            .expect("sink lock poisoned")
            .clone()
            .ok_or(SimError::NotConnected)
    }

    async fn send<T: serde::Serialize>(&self, command: Command, payload: &T) -> Result<(), SimError> {
        self.sink()?.send(&Envelope::new(command, payload)?).await
    }

    async fn send_location(
        &self,
        point: GeoPoint,
        vehicle_category_id: Option<u32>,
    ) -> Result<(), SimError> {
        let payload = DriverLocationPayload {
            raw_location: RawLocation::point(point),
            vehicle_category_id,
        };
        self.send(Command::DriverLocation, &payload).await
    }

    async fn send_action(&self, command: Command, trip_id: &str) -> Result<(), SimError> {
        let payload = TripActionPayload {
            trip_id: trip_id.to_string(),
        };
        self.send(command, &payload).await
    }
}

#[async_trait]
impl ControlHandler for DriverActor {
    async fn handle(self: Arc<Self>, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::InitConnection => self.init_connection().await,
            ControlRequest::SetLocation { lat, lng } => {
                self.set_location(GeoPoint::new(lat, lng)).await
            }
            ControlRequest::GoOnline => self.go_online().await,
            ControlRequest::TripEstimate { .. } | ControlRequest::ConfirmTrip { .. } => {
                ControlResponse::fail("unsupported operation for a driver actor")
            }
        }
    }
}

#[async_trait]
impl CommandHandler for DriverActor {
    async fn on_command(self: Arc<Self>, envelope: Envelope) {
        match envelope.command {
            Command::NewTripOffer => self.on_trip_offer(&envelope).await,
            Command::CompleteTrip => self.on_trip_completed().await,
            Command::Eta => {
                debug!(actor_id = %self.identity.id, "eta update received");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptance_rate_converges_over_many_draws() {
        let rate = 0.5;
        let trials = 10_000;
        let accepted = (0..trials).filter(|_| should_accept(rate)).count();
        let observed = accepted as f64 / trials as f64;
        assert!(
            (observed - rate).abs() < 0.02,
            "observed acceptance {observed} too far from {rate}"
        );
    }

    #[test]
    fn extreme_rates_are_deterministic() {
        assert!((0..1000).all(|_| should_accept(1.0)));
        assert!(!(0..1000).any(|_| should_accept(0.0)));
    }
}
