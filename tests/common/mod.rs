//! Shared fixtures for the integration tests: an in-memory collaborator
//! set (fake registry, fake backend, mocked channels, millisecond timing)
//! plus envelope helpers for probing a mocked channel.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use ride_sim::backend::MockBackend;
use ride_sim::channel::mock::{MockChannel, MockConnector};
use ride_sim::config::Timing;
use ride_sim::lifecycle::SimContext;
use ride_sim::model::Identity;
use ride_sim::protocol::{Command, Envelope};
use ride_sim::registry::MemoryRegistry;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A context wired entirely to in-memory fakes, with millisecond pacing so
/// a full trip lifecycle completes quickly.
pub fn test_context(connector: Arc<MockConnector>) -> SimContext {
    SimContext {
        registry: Arc::new(MemoryRegistry::new()),
        backend: Arc::new(MockBackend::default()),
        connector,
        timing: Timing::fast(),
    }
}

pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        name: format!("sim {id}"),
        phone_number: "1111100000".to_string(),
        access_token: format!("token-{id}"),
    }
}

/// Receives the next outbound envelope, failing the test on timeout or a
/// closed channel.
pub async fn next_envelope(probe: &mut MockChannel) -> Envelope {
    timeout(RECV_TIMEOUT, probe.outbound.recv())
        .await
        .expect("timed out waiting for an outbound envelope")
        .expect("actor closed its channel")
}

/// Receives the next outbound envelope that is not a `driverLocation`
/// ping; the ping loop interleaves freely with trip-progress commands.
pub async fn next_non_location(probe: &mut MockChannel) -> Envelope {
    loop {
        let envelope = next_envelope(probe).await;
        if envelope.command != Command::DriverLocation {
            return envelope;
        }
    }
}

/// Asserts that nothing arrives on the channel within `window`.
pub async fn assert_silent(probe: &mut MockChannel, window: Duration) {
    if let Ok(Some(envelope)) = timeout(window, probe.outbound.recv()).await {
        panic!("expected a quiet channel, got {:?}", envelope.command);
    }
}
