//! Configuration for the simulation engine.
//!
//! - `SIM_BACKEND_URL`: backend HTTP base URL (default `http://localhost:8080`)
//! - `SIM_WS_URL`: realtime channel base URL (default `ws://localhost:8080`)
//! - `SIM_REDIS_URL`: registry store URL (default `redis://127.0.0.1:6379`)

use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const DEFAULT_WS_URL: &str = "ws://localhost:8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Fixed client-side timeout applied to every backend HTTP call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(100);

/// Endpoint configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub backend_url: String,
    pub ws_url: String,
    pub redis_url: String,
}

impl SimConfig {
    /// Builds the configuration from environment variables, falling back to
    /// local-development defaults.
    pub fn from_env() -> Self {
        Self {
            backend_url: std::env::var("SIM_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            ws_url: std::env::var("SIM_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
            redis_url: std::env::var("SIM_REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
        }
    }
}

/// The fixed simulated delays that pace an actor through a trip.
///
/// Real deployments use [`Timing::default`]; tests inject [`Timing::fast`]
/// so a full trip lifecycle completes in milliseconds. Every sleep in the
/// driver and customer state machines goes through one of these fields;
/// there are no hard-coded durations inside the actors.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Pause between accepting an offer and driving to the pickup.
    pub before_arrival: Duration,
    /// Interval of the periodic self-location broadcast.
    pub location_ping: Duration,
    /// Pause between arriving at the pickup and starting the trip.
    pub before_start_trip: Duration,
    /// Pause between reaching the destination and completing the trip.
    pub before_complete_trip: Duration,
    /// Pacing between consecutive coordinates while replaying a route.
    pub route_ping: Duration,
    /// Customer cooldown before confirming the return trip when looping.
    pub loop_cooldown: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            before_arrival: Duration::from_secs(10),
            location_ping: Duration::from_secs(50),
            before_start_trip: Duration::from_secs(5),
            before_complete_trip: Duration::from_secs(5),
            route_ping: Duration::from_secs(2),
            loop_cooldown: Duration::from_secs(20),
        }
    }
}

impl Timing {
    /// Millisecond-scale delays for tests and local demos.
    pub fn fast() -> Self {
        Self {
            before_arrival: Duration::from_millis(10),
            location_ping: Duration::from_millis(50),
            before_start_trip: Duration::from_millis(5),
            before_complete_trip: Duration::from_millis(5),
            route_ping: Duration::from_millis(2),
            loop_cooldown: Duration::from_millis(20),
        }
    }
}
