//! Session storage adapters for [`postgate_auth::SessionRegistry`].

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisSessionStore;
