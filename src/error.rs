//! # Simulation Errors
//!
//! This module defines the common error type used throughout the simulation
//! engine. By centralizing error definitions, we keep a consistent taxonomy
//! across actors, the control plane, and the external collaborators.
//!
//! The variants map onto distinct failure classes:
//!
//! - `ActorNotFound`: a registry lookup came back empty. Deliberately
//!   distinct from a network failure to an address that *was* found, so that
//!   callers can tell "no such actor" apart from "actor unreachable".
//! - `NotConnected`: a control operation needed the realtime channel before
//!   `InitConnection` succeeded.
//! - `Backend`: the backend answered but reported `status != true`; carries
//!   the backend's own message.
//! - Transport variants (`Store`, `Http`, `Ws`, `Io`, `Codec`) wrap the
//!   underlying client errors via `#[from]`.

/// Errors that can occur within the simulation engine.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("actor not found: {0}")]
    ActorNotFound(String),
    #[error("realtime channel not connected")]
    NotConnected,
    #[error("backend rejected request: {0}")]
    Backend(String),
    #[error("registry store error: {0}")]
    Store(#[from] redis::RedisError),
    #[error("backend transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
