use std::sync::Arc;

use async_trait::async_trait;

use postgate_blog::Item;
use postgate_core::{DomainResult, ItemId};

/// Persistent item storage: the source of truth behind the cache.
///
/// Outcomes: `NotFound` for a missing id (get/update/delete), `Conflict` for
/// a duplicate id on create, `Unavailable` for backend failures.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: Item) -> DomainResult<Item>;

    async fn get_by_id(&self, id: ItemId) -> DomainResult<Item>;

    async fn list(&self) -> DomainResult<Vec<Item>>;

    async fn update(&self, item: Item) -> DomainResult<Item>;

    async fn delete(&self, id: ItemId) -> DomainResult<()>;

    /// Returns the number of items removed.
    async fn delete_all(&self) -> DomainResult<u64>;
}

#[async_trait]
impl<R> ItemRepository for Arc<R>
where
    R: ItemRepository + ?Sized,
{
    async fn create(&self, item: Item) -> DomainResult<Item> {
        (**self).create(item).await
    }

    async fn get_by_id(&self, id: ItemId) -> DomainResult<Item> {
        (**self).get_by_id(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        (**self).list().await
    }

    async fn update(&self, item: Item) -> DomainResult<Item> {
        (**self).update(item).await
    }

    async fn delete(&self, id: ItemId) -> DomainResult<()> {
        (**self).delete(id).await
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        (**self).delete_all().await
    }
}
