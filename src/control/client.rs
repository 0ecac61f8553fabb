//! Control-plane caller: registry lookup, dial, one call, close.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use super::{ControlRequest, ControlResponse};
use crate::error::SimError;
use crate::registry::Registry;

/// Addresses control operations to live actors by id.
///
/// A missing registry entry is [`SimError::ActorNotFound`] and issues no
/// dial; transport failures to a *found* address surface as their own
/// error kinds so callers can tell the two apart.
#[derive(Clone)]
pub struct ControlClient {
    registry: Arc<dyn Registry>,
}

impl ControlClient {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    pub async fn init_connection(&self, id: &str) -> Result<ControlResponse, SimError> {
        self.call(id, &ControlRequest::InitConnection).await
    }

    pub async fn set_location(
        &self,
        id: &str,
        lat: f64,
        lng: f64,
    ) -> Result<ControlResponse, SimError> {
        self.call(id, &ControlRequest::SetLocation { lat, lng }).await
    }

    pub async fn go_online(&self, id: &str) -> Result<ControlResponse, SimError> {
        self.call(id, &ControlRequest::GoOnline).await
    }

    pub async fn trip_estimate(
        &self,
        id: &str,
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
    ) -> Result<ControlResponse, SimError> {
        self.call(
            id,
            &ControlRequest::TripEstimate {
                origin_lat,
                origin_lng,
                destination_lat,
                destination_lng,
            },
        )
        .await
    }

    pub async fn confirm_trip(
        &self,
        id: &str,
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
    ) -> Result<ControlResponse, SimError> {
        self.call(
            id,
            &ControlRequest::ConfirmTrip {
                origin_lat,
                origin_lng,
                destination_lat,
                destination_lng,
            },
        )
        .await
    }

    /// Connection-per-call transport: dial, write one request line, read
    /// one response line, drop the connection.
    async fn call(&self, id: &str, request: &ControlRequest) -> Result<ControlResponse, SimError> {
        let address = self
            .registry
            .get(id)
            .await?
            .ok_or_else(|| SimError::ActorNotFound(id.to_string()))?;
        debug!(actor_id = id, address, ?request, "control call");

        let stream = TcpStream::connect(&address).await?;
        let (read_half, mut write_half) = stream.into_split();

        let mut encoded = serde_json::to_string(request)?;
        encoded.push('\n');
        write_half.write_all(encoded.as_bytes()).await?;

        let mut lines = BufReader::new(read_half).lines();
        let line = lines.next_line().await?.ok_or_else(|| {
            SimError::Channel(format!("actor {id} closed control connection"))
        })?;
        Ok(serde_json::from_str(&line)?)
    }
}
