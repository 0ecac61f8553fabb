//! Simulation runner.
//!
//! Reads a scenario description from a JSON file, connects the production
//! collaborators (backend HTTP client, websocket connector, Redis
//! registry), launches the actors, and keeps them alive until Ctrl-C.
//!
//! ```text
//! RUST_LOG=ride_sim=info ride-sim scenario.json
//! ```

use std::sync::Arc;

use tracing::info;

use ride_sim::backend::HttpBackend;
use ride_sim::channel::WsConnector;
use ride_sim::config::{SimConfig, Timing};
use ride_sim::error::SimError;
use ride_sim::lifecycle::{setup_tracing, SimContext};
use ride_sim::registry::RedisRegistry;
use ride_sim::scenario::{self, Scenario};

#[tokio::main]
async fn main() -> Result<(), SimError> {
    setup_tracing();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: ride-sim <scenario.json>");
        std::process::exit(2);
    };
    let raw = std::fs::read_to_string(&path)?;
    let scenario: Scenario = serde_json::from_str(&raw)?;

    let config = SimConfig::from_env();
    let registry = RedisRegistry::connect(&config.redis_url).await?;
    let backend = HttpBackend::new(&config.backend_url)?;
    let connector = WsConnector::new(&config.ws_url);

    let ctx = SimContext {
        registry: Arc::new(registry),
        backend: Arc::new(backend),
        connector: Arc::new(connector),
        timing: Timing::default(),
    };

    let handle = scenario::launch(&scenario, &ctx).await;
    info!(actors = handle.len(), "scenario running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}
