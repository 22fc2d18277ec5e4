//! Resource cache: a best-effort memo of serialized read results.
//!
//! The cache is never a source of truth. Callers treat `Unavailable` as a
//! miss and fall back to storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use postgate_core::{DomainError, ItemId};

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryResourceCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisResourceCache;

/// Default entry lifetime: 10 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Key of the aggregate item list.
pub const ALL_ITEMS_KEY: &str = "items:all";

/// Key of a single item.
pub fn item_key(id: ItemId) -> String {
    format!("item:{id}")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable(msg) => DomainError::Unavailable(msg),
        }
    }
}

#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// `Ok(None)` is a miss; expired entries are misses.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Idempotent.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<C> ResourceCache for Arc<C>
where
    C: ResourceCache + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl).await
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        (**self).invalidate(key).await
    }
}
