//! # Scenario Launcher
//!
//! Takes a scenario description (how many drivers and customers, where,
//! and how they behave) and brings the requested actors to life: one
//! concurrent task per actor performs the backend login, spawns the actor,
//! and drives its control-plane bring-up through the registry exactly the
//! way an external trigger would.
//!
//! A failed login or bring-up abandons that one actor (logged, not
//! retried); the rest of the scenario proceeds.

use rand::thread_rng;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::control::ControlClient;
use crate::customer::CustomerActor;
use crate::driver::DriverActor;
use crate::error::SimError;
use crate::lifecycle::{ActorHandle, SimContext};
use crate::movement::{random_point_in_radius, GeoPoint};

/// Base of the simulated phone-number series; per-actor numbers are
/// `SERIES_BASE + series_start + i`.
const SERIES_BASE: u64 = 1_111_100_000;

/// Customer destinations are sampled from a wider circle than origins.
const DESTINATION_RADIUS_FACTOR: f64 = 4.0;

/// A scenario request, as accepted from the trigger surface.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub num_drivers: u32,
    #[serde(default)]
    pub num_customers: u32,
    pub center_lat: f64,
    pub center_lng: f64,
    /// Spawn radius in kilometers.
    pub radius: f64,
    /// Whether customers ride back and forth indefinitely.
    #[serde(default, rename = "loop")]
    pub loop_trips: bool,
    pub acceptance_rate: f64,
    #[serde(default)]
    pub driver_series_start: u32,
    #[serde(default)]
    pub customer_series_start: u32,
}

impl Scenario {
    fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lng)
    }

    fn radius_m(&self) -> f64 {
        self.radius * 1000.0
    }
}

/// Every actor a launched scenario created, stoppable as a unit.
pub struct ScenarioHandle {
    actors: Vec<ActorHandle>,
}

impl ScenarioHandle {
    pub fn actors(&self) -> &[ActorHandle] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Deterministically stops every actor this scenario spawned.
    pub async fn shutdown(self) {
        for actor in self.actors {
            actor.shutdown().await;
        }
    }
}

/// Launches all requested actors concurrently and waits for bring-up to
/// finish. Returns handles for every actor that came into existence.
pub async fn launch(scenario: &Scenario, ctx: &SimContext) -> ScenarioHandle {
    let mut tasks: JoinSet<Option<ActorHandle>> = JoinSet::new();
    let center = scenario.center();
    let radius_m = scenario.radius_m();

    for i in 1..=scenario.num_drivers {
        let phone_number =
            (SERIES_BASE + scenario.driver_series_start as u64 + i as u64).to_string();
        let start = random_point_in_radius(center, radius_m, &mut thread_rng());
        let acceptance_rate = scenario.acceptance_rate;
        let ctx = ctx.clone();
        tasks.spawn(async move {
            match launch_driver(phone_number.clone(), start, acceptance_rate, ctx).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(phone_number, error = %e, "driver bring-up failed");
                    None
                }
            }
        });
    }

    for i in 1..=scenario.num_customers {
        let phone_number =
            (SERIES_BASE + scenario.customer_series_start as u64 + i as u64).to_string();
        let origin = random_point_in_radius(center, radius_m, &mut thread_rng());
        let destination =
            random_point_in_radius(center, radius_m * DESTINATION_RADIUS_FACTOR, &mut thread_rng());
        let loop_trips = scenario.loop_trips;
        let ctx = ctx.clone();
        tasks.spawn(async move {
            match launch_customer(phone_number.clone(), origin, destination, loop_trips, ctx).await
            {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(phone_number, error = %e, "customer bring-up failed");
                    None
                }
            }
        });
    }

    let mut actors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(handle)) => actors.push(handle),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "bring-up task panicked"),
        }
    }
    info!(actors = actors.len(), "scenario launched");
    ScenarioHandle { actors }
}

/// Login → spawn → `GoOnline` → `InitConnection`, all through the same
/// control plane an external caller uses.
async fn launch_driver(
    phone_number: String,
    start: GeoPoint,
    acceptance_rate: f64,
    ctx: SimContext,
) -> Result<ActorHandle, SimError> {
    let identity = ctx.backend.driver_login(&phone_number).await?;
    let id = identity.id.clone();
    let handle = DriverActor::spawn(identity, start, acceptance_rate, ctx.clone()).await?;

    let control = ControlClient::new(ctx.registry.clone());
    let online = control.go_online(&id).await?;
    if !online.success {
        warn!(actor_id = %id, message = ?online.message, "driver did not go online");
    }
    let connected = control.init_connection(&id).await?;
    if !connected.success {
        warn!(actor_id = %id, message = ?connected.message, "driver channel not connected");
    }
    Ok(handle)
}

/// Login → spawn → `InitConnection` → first `ConfirmTrip`.
async fn launch_customer(
    phone_number: String,
    origin: GeoPoint,
    destination: GeoPoint,
    loop_trips: bool,
    ctx: SimContext,
) -> Result<ActorHandle, SimError> {
    let identity = ctx.backend.customer_login(&phone_number).await?;
    let id = identity.id.clone();
    let handle = CustomerActor::spawn(identity, origin, loop_trips, ctx.clone()).await?;

    let control = ControlClient::new(ctx.registry.clone());
    let connected = control.init_connection(&id).await?;
    if !connected.success {
        warn!(actor_id = %id, message = ?connected.message, "customer channel not connected");
    }
    let confirmed = control
        .confirm_trip(&id, origin.lat, origin.lng, destination.lat, destination.lng)
        .await?;
    if !confirmed.success {
        warn!(actor_id = %id, message = ?confirmed.message, "initial trip confirm failed");
    }
    Ok(handle)
}
