//! # Actor Registry
//!
//! Shared mapping from actor id to the `host:port` address of that actor's
//! control endpoint. Every process in the simulation reaches the same
//! store, so a trigger running anywhere can locate any live actor.
//!
//! The store is behind the [`Registry`] trait and an explicit client value
//! is passed to every component that needs one; there is no process-wide
//! singleton. Production uses [`RedisRegistry`]; tests and single-process
//! runs use [`MemoryRegistry`].
//!
//! Contract notes:
//!
//! - `set` is last-writer-wins per id; concurrent writes for *different*
//!   ids never contend.
//! - `get` returns `Ok(None)` for an unknown id. Callers must treat that
//!   and a failed dial to a returned address as the same condition: the
//!   actor is gone.
//! - Entries carry no TTL. `remove` exists so an orderly shutdown can
//!   deregister, but a crashed process still leaves its entry behind.

mod redis;

pub use self::redis::RedisRegistry;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SimError;

/// Shared id → control-endpoint-address store.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn set(&self, id: &str, address: &str) -> Result<(), SimError>;
    async fn get(&self, id: &str) -> Result<Option<String>, SimError>;
    async fn remove(&self, id: &str) -> Result<(), SimError>;
}

/// In-process registry used by tests and single-process scenarios.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn set(&self, id: &str, address: &str) -> Result<(), SimError> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .insert(id.to_string(), address.to_string());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<String>, SimError> {
        Ok(self
            .entries
            .lock()
            .expect("registry lock poisoned")
            .get(id)
            .cloned())
    }

    async fn remove(&self, id: &str) -> Result<(), SimError> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .remove(id);
        Ok(())
    }
}
