//! Infrastructure layer: storage adapters, resource cache, cached item
//! service, background workers and configuration.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod items;
pub mod pg;
pub mod sessions;
pub mod workers;
