//! Redis-backed resource cache (`SET .. EX`, `GET`, `DEL`).

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::{CacheError, ResourceCache};

#[derive(Clone)]
pub struct RedisResourceCache {
    conn: MultiplexedConnection,
}

fn unavailable(e: impl core::fmt::Display) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

impl RedisResourceCache {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ResourceCache for RedisResourceCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        // EX takes whole seconds; anything shorter is not worth a round trip.
        let secs = ttl.as_secs();
        if secs == 0 {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, secs).await.map_err(unavailable)
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(unavailable)
    }
}
