//! # Lifecycle & Orchestration
//!
//! Wiring for the actor system: the injected collaborator set
//! ([`SimContext`]), the owned handle each spawned actor returns
//! ([`ActorHandle`]), and tracing setup.
//!
//! Actors receive their collaborators (registry, backend, channel
//! connector, timing) as explicit values at spawn time. There are no
//! process-wide singletons, which is what lets every integration test run
//! against in-memory fakes.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::warn;

use crate::backend::BackendApi;
use crate::channel::ChannelConnector;
use crate::config::Timing;
use crate::control::ControlServer;
use crate::registry::Registry;

/// The collaborators injected into every actor.
#[derive(Clone)]
pub struct SimContext {
    pub registry: Arc<dyn Registry>,
    pub backend: Arc<dyn BackendApi>,
    pub connector: Arc<dyn ChannelConnector>,
    pub timing: Timing,
}

/// Task handles an actor accumulates over its lifetime (dispatcher loop,
/// ping loop). Shared between the actor, which spawns them, and its
/// [`ActorHandle`], which aborts them on shutdown.
pub type TaskSet = Arc<Mutex<Vec<JoinHandle<()>>>>;

pub fn new_task_set() -> TaskSet {
    Arc::new(Mutex::new(Vec::new()))
}

/// Owned handle to one live actor.
///
/// Dropping the handle leaves the actor running (matching a fire-and-forget
/// trigger); calling [`ActorHandle::shutdown`] stops its control endpoint,
/// aborts every task it spawned, and removes its registry entry.
pub struct ActorHandle {
    id: String,
    server: ControlServer,
    tasks: TaskSet,
    registry: Arc<dyn Registry>,
}

impl ActorHandle {
    pub fn new(id: String, server: ControlServer, tasks: TaskSet, registry: Arc<dyn Registry>) -> Self {
        Self {
            id,
            server,
            tasks,
            registry,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Address of the actor's control endpoint.
    pub fn control_address(&self) -> &str {
        self.server.address()
    }

    /// Deterministically stops the actor and deregisters it.
    pub async fn shutdown(self) {
        self.server.stop();
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().expect("task set lock poisoned");
            tasks.drain(..).collect()
        };
        for handle in handles {
            handle.abort();
        }
        if let Err(e) = self.registry.remove(&self.id).await {
            warn!(actor_id = %self.id, error = %e, "deregistration failed");
        }
    }
}

/// Initializes structured logging for the whole process.
///
/// Verbosity is controlled through `RUST_LOG`, e.g. `RUST_LOG=ride_sim=debug`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
