//! # ride-sim
//!
//! Simulates fleets of driver and customer actors that behave like real
//! mobile-app clients of a ride-hailing backend: each one logs in, opens a
//! realtime channel, exchanges command envelopes, and walks the full trip
//! lifecycle (offer → accept/reject → arrival → start → completion →
//! rating) while moving along decoded route geometry.
//!
//! ## Architecture
//!
//! - [`scenario`]: turns a scenario request into concurrent login + spawn
//!   tasks, one per actor.
//! - [`driver`] / [`customer`]: the per-actor trip state machines.
//! - [`control`]: the ephemeral per-actor RPC surface (one TCP port per
//!   live actor) that lets an external trigger command one specific actor.
//! - [`registry`]: the shared id-to-control-endpoint mapping that makes
//!   actors discoverable across processes.
//! - [`dispatcher`]: the strictly-in-order read loop over each actor's
//!   realtime channel.
//! - [`protocol`]: the `{command, payload}` envelope with a typed payload
//!   per command kind.
//! - [`channel`] / [`backend`]: the realtime transport and backend HTTP
//!   collaborators, behind injectable traits with mock implementations.
//! - [`movement`]: geodesic spawn points and polyline replay.
//!
//! Each actor's mutable state is owned by that actor alone; the registry
//! is the only resource shared across actors, and all of an actor's
//! outbound channel writes are serialized through one sink.

pub mod backend;
pub mod channel;
pub mod config;
pub mod control;
pub mod customer;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod movement;
pub mod protocol;
pub mod registry;
pub mod scenario;

pub use error::SimError;
