//! # Customer Actor
//!
//! One [`CustomerActor`] per simulated rider, walking:
//!
//! `Created → Connected → EstimateRequested → TripConfirmed →
//! AwaitingCompletion → Completed → (loop → TripConfirmed | terminal)`
//!
//! The trigger confirms the first trip right after spawn; the confirm
//! acknowledgment carries the trip id, and the completion command closes
//! the cycle with a driver rating. A looping customer then rides back:
//! after a cooldown it confirms a new trip with origin and destination
//! swapped. A non-looping customer goes quiet but keeps its connection
//! open.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::channel::ChannelSink;
use crate::control::{ControlHandler, ControlRequest, ControlResponse, ControlServer};
use crate::dispatcher::{self, CommandHandler};
use crate::error::SimError;
use crate::lifecycle::{new_task_set, ActorHandle, SimContext, TaskSet};
use crate::model::{sample_rating, Identity};
use crate::movement::GeoPoint;
use crate::protocol::{
    Command, ConfirmTripAck, Envelope, TripRatingPayload, TripRequestPayload,
};

const CHANNEL_PATH: &str = "/ws/customer";
/// Vehicle category applied when confirming a trip.
const DEFAULT_VEHICLE_CATEGORY: u32 = 1;

pub struct CustomerActor {
    identity: Identity,
    loop_trips: bool,
    position: Mutex<GeoPoint>,
    /// Origin/destination of the in-flight trip, set on confirm.
    route: Mutex<Option<(GeoPoint, GeoPoint)>>,
    trip_id: Mutex<Option<String>>,
    /// Latest estimate echo from the backend, kept for inspection.
    estimate: Mutex<Option<serde_json::Value>>,
    sink: Mutex<Option<Arc<dyn ChannelSink>>>,
    tasks: TaskSet,
    ctx: SimContext,
}

impl CustomerActor {
    pub async fn spawn(
        identity: Identity,
        start: GeoPoint,
        loop_trips: bool,
        ctx: SimContext,
    ) -> Result<ActorHandle, SimError> {
        let id = identity.id.clone();
        let tasks = new_task_set();
        let registry = ctx.registry.clone();

        let actor = Arc::new(Self {
            identity,
            loop_trips,
            position: Mutex::new(start),
            route: Mutex::new(None),
            trip_id: Mutex::new(None),
            estimate: Mutex::new(None),
            sink: Mutex::new(None),
            tasks: tasks.clone(),
            ctx,
        });

        let handler: Arc<dyn ControlHandler> = actor;
        let server = ControlServer::bind(&id, handler, registry.as_ref()).await?;
        info!(actor_id = %id, address = server.address(), "customer actor spawned");
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
        self.tasks
            .lock()
            .expect("task set lock poisoned")
            .push(read_loop);

        info!(actor_id = %self.identity.id, "realtime channel connected");
        ControlResponse::ok()
    }

    async fn request_estimate(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> ControlResponse {
        let payload = TripRequestPayload {
            origin: origin.into(),
            destination: destination.into(),
            vehicle_category_id: None,
        };
        match self.send(Command::RequestEstimate, &payload).await {
            Ok(()) => ControlResponse::ok(),
            Err(e) => {
                warn!(actor_id = %self.identity.id, error = %e, "estimate request failed");
                ControlResponse::fail(e.to_string())
            }
        }
    }

    /// Stores the route as the in-flight trip and emits `confirmTrip` with
    /// the default vehicle category.
    async fn confirm_trip(&self, origin: GeoPoint, destination: GeoPoint) -> Result<(), SimError> {
        *self.route.lock().expect("route lock poisoned") = Some((origin, destination));
        let payload = TripRequestPayload {
            origin: origin.into(),
            destination: destination.into(),
            vehicle_category_id: Some(DEFAULT_VEHICLE_CATEGORY),
        };
        self.send(Command::ConfirmTrip, &payload).await
    }

    // --- Channel handlers ---

    fn on_confirm_ack(&self, envelope: &Envelope) {
        let ack: ConfirmTripAck = match envelope.decode() {
            Ok(ack) => ack,
            Err(e) => {
                warn!(actor_id = %self.identity.id, error = %e, "dropping unreadable confirm ack");
                return;
            }
        };
        info!(actor_id = %self.identity.id, trip_id = ack.id, "trip confirmed");
        *self.trip_id.lock().expect("trip id lock poisoned") = Some(ack.id);
    }

    async fn on_trip_completed(&self) {
        let trip_id = self.trip_id.lock().expect("trip id lock poisoned").clone();
        let Some(trip_id) = trip_id else {
            warn!(actor_id = %self.identity.id, "trip completion without a confirmed trip");
            return;
        };

        let payload = TripRatingPayload {
            trip_id: trip_id.clone(),
            rating: sample_rating(),
        };
        info!(actor_id = %self.identity.id, trip_id, rating = payload.rating, "rating driver");
        if let Err(e) = self.send(Command::RateDriver, &payload).await {
            warn!(actor_id = %self.identity.id, error = %e, "driver rating failed");
        }

        if !self.loop_trips {
            return;
        }

        // Round trip: ride back from where this trip ended.
        let route = *self.route.lock().expect("route lock poisoned");
        let Some((origin, destination)) = route else {
            warn!(actor_id = %self.identity.id, "loop requested without a stored route");
            return;
        };
        sleep(self.ctx.timing.loop_cooldown).await;
        info!(actor_id = %self.identity.id, "confirming return trip");
        if let Err(e) = self.confirm_trip(destination, origin).await {
            warn!(actor_id = %self.identity.id, error = %e, "return trip confirm failed");
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
}

#[async_trait]
impl ControlHandler for CustomerActor {
    async fn handle(self: Arc<Self>, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::InitConnection => self.init_connection().await,
            ControlRequest::SetLocation { lat, lng } => {
                *self.position.lock().expect("position lock poisoned") = GeoPoint::new(lat, lng);
                ControlResponse::ok()
            }
            ControlRequest::TripEstimate {
                origin_lat,
                origin_lng,
                destination_lat,
                destination_lng,
            } => {
                self.request_estimate(
                    GeoPoint::new(origin_lat, origin_lng),
                    GeoPoint::new(destination_lat, destination_lng),
                )
                .await
            }
            ControlRequest::ConfirmTrip {
                origin_lat,
                origin_lng,
                destination_lat,
                destination_lng,
            } => {
                let confirm = self
                    .confirm_trip(
                        GeoPoint::new(origin_lat, origin_lng),
                        GeoPoint::new(destination_lat, destination_lng),
                    )
                    .await;
                match confirm {
                    Ok(()) => ControlResponse::ok(),
                    Err(e) => {
                        warn!(actor_id = %self.identity.id, error = %e, "trip confirm failed");
                        ControlResponse::fail(e.to_string())
                    }
                }
            }
            ControlRequest::GoOnline => {
                ControlResponse::fail("unsupported operation for a customer actor")
            }
        }
    }
}

#[async_trait]
impl CommandHandler for CustomerActor {
    async fn on_command(self: Arc<Self>, envelope: Envelope) {
        match envelope.command {
            Command::RequestEstimate => {
                debug!(actor_id = %self.identity.id, "estimate received");
                *self.estimate.lock().expect("estimate lock poisoned") =
                    Some(envelope.payload.clone());
            }
            Command::ConfirmTrip => self.on_confirm_ack(&envelope),
            Command::CompleteTrip => self.on_trip_completed().await,
            Command::Eta => {
                debug!(actor_id = %self.identity.id, "eta update received");
            }
            Command::DriverLocation => {
                debug!(actor_id = %self.identity.id, "driver location received");
            }
            _ => {}
        }
    }
}
