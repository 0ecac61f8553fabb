//! Redis-backed registry store.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::Registry;
use crate::error::SimError;

/// Registry entries live in Redis as plain `id → "host:port"` strings with
/// no expiry. The multiplexed connection is cheap to clone, so each call
/// works on its own handle without a pool.
pub struct RedisRegistry {
    conn: MultiplexedConnection,
}

impl RedisRegistry {
    /// Connects to the store at `url` (e.g. `redis://127.0.0.1:6379`) and
    /// verifies the connection with a ping.
    pub async fn connect(url: &str) -> Result<Self, SimError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Registry for RedisRegistry {
    async fn set(&self, id: &str, address: &str) -> Result<(), SimError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(id, address).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<String>, SimError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(id).await?;
        if !exists {
            return Ok(None);
        }
        let value: String = conn.get(id).await?;
        Ok(Some(value))
    }

    async fn remove(&self, id: &str) -> Result<(), SimError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(id).await?;
        Ok(())
    }
}
