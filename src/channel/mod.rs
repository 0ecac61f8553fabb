//! # Realtime Channel
//!
//! Each actor owns one bidirectional message connection to the backend.
//! The transport is split into two halves:
//!
//! - [`ChannelSink`]: the outbound half. It is shared (`Arc`) between the
//!   actor's dispatcher, its control operations, and the driver's periodic
//!   ping task; implementations serialize all writes internally, so holding
//!   a sink *is* the single-writer permit the concurrency model requires.
//! - [`ChannelStream`]: the inbound half, owned exclusively by the
//!   dispatcher's read loop. A `None` from `next` means the channel closed;
//!   an `Err` is a read failure. Both end the loop.
//!
//! [`ChannelConnector`] is the injectable factory: production uses the
//! websocket implementation, tests feed actors through [`mock`] pairs.

pub mod mock;
mod ws;

pub use ws::WsConnector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SimError;
use crate::protocol::Envelope;

/// Outbound half of a realtime channel. Writes are serialized internally.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), SimError>;
}

/// Inbound half of a realtime channel. Yields raw message text; parsing
/// (and the malformed-versus-unknown policy) belongs to the dispatcher.
#[async_trait]
pub trait ChannelStream: Send {
    async fn next(&mut self) -> Option<Result<String, SimError>>;
}

/// Opens a realtime channel for one actor, authenticated with its token.
///
/// `path` selects the backend endpoint role (`/ws/driver` or
/// `/ws/customer`).
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(
        &self,
        path: &str,
        token: &str,
    ) -> Result<(Arc<dyn ChannelSink>, Box<dyn ChannelStream>), SimError>;
}
