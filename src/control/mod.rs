//! # Per-Actor Control Plane
//!
//! Every live actor exposes a small RPC surface on its own TCP port so an
//! external trigger can address that one specific actor: look the id up in
//! the registry, dial the address, invoke one operation, release the
//! connection. Nothing is pooled or retried here; retry policy belongs to
//! the caller.
//!
//! The wire format is one newline-terminated JSON [`ControlRequest`] per
//! connection, answered by one JSON [`ControlResponse`]. All operations are
//! idempotent-safe to retry.

mod client;
mod server;

pub use client::ControlClient;
pub use server::{ControlHandler, ControlServer};

use serde::{Deserialize, Serialize};

/// A control-plane operation addressed to one live actor.
///
/// `GoOnline` is only meaningful for drivers; `TripEstimate` and
/// `ConfirmTrip` only for customers. An actor answers an operation outside
/// its role with `success = false` rather than a transport error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ControlRequest {
    InitConnection,
    SetLocation {
        lat: f64,
        lng: f64,
    },
    GoOnline,
    TripEstimate {
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
    },
    ConfirmTrip {
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
    },
}

/// Outcome of a control operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}
