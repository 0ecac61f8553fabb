//! Per-actor control endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ControlRequest, ControlResponse};
use crate::error::SimError;
use crate::registry::Registry;

/// Implemented by each actor type; routes one control operation to the
/// actor's own logic.
#[async_trait]
pub trait ControlHandler: Send + Sync + 'static {
    async fn handle(self: Arc<Self>, request: ControlRequest) -> ControlResponse;
}

/// One control endpoint, bound to an OS-assigned port at construction and
/// registered in the shared registry under the actor's id.
pub struct ControlServer {
    address: String,
    accept_task: JoinHandle<()>,
}

impl ControlServer {
    /// Binds an ephemeral port, publishes `id → address`, and starts
    /// serving. Each accepted connection carries exactly one call.
    pub async fn bind(
        id: &str,
        handler: Arc<dyn ControlHandler>,
        registry: &dyn Registry,
    ) -> Result<Self, SimError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("127.0.0.1:{}", listener.local_addr()?.port());
        registry.set(id, &address).await?;
        debug!(actor_id = id, address, "control endpoint registered");

        let actor_id = id.to_string();
        let accept_task = tokio::spawn(accept_loop(listener, handler, actor_id));
        Ok(Self {
            address,
            accept_task,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Stops accepting control calls. In-flight calls are aborted too.
    pub fn stop(&self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, handler: Arc<dyn ControlHandler>, actor_id: String) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(actor_id, error = %e, "control accept failed");
                return;
            }
        };
        debug!(actor_id, %peer, "control call");
        let handler = handler.clone();
        // One task per call: a slow operation (e.g. GoOnline hitting the
        // backend) must not block other callers of this actor.
        tokio::spawn(serve_call(stream, handler));
    }
}

async fn serve_call(stream: TcpStream, handler: Arc<dyn ControlHandler>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let line = match lines.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "control read failed");
            return;
        }
    };

    let response = match serde_json::from_str::<ControlRequest>(&line) {
        Ok(request) => handler.handle(request).await,
        Err(e) => ControlResponse::fail(format!("malformed control request: {e}")),
    };

    let mut encoded = match serde_json::to_string(&response) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(error = %e, "control response encode failed");
            return;
        }
    };
    encoded.push('\n');
    if let Err(e) = write_half.write_all(encoded.as_bytes()).await {
        warn!(error = %e, "control write failed");
    }
}
