//! Item storage and the cached item service.

pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod service;

pub use in_memory::InMemoryItemRepository;
pub use postgres::PostgresItemRepository;
pub use repository::ItemRepository;
pub use service::{ItemService, Scope};
