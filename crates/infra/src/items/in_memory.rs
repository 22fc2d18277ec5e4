use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use postgate_blog::Item;
use postgate_core::{DomainError, DomainResult, ItemId};

use super::ItemRepository;

/// In-memory item repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("item store lock poisoned")
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, item: Item) -> DomainResult<Item> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        if items.contains_key(&item.id) {
            return Err(DomainError::conflict(format!("item {} exists", item.id)));
        }
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: ItemId) -> DomainResult<Item> {
        let items = self.items.read().map_err(|_| poisoned())?;
        items.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        let mut all: Vec<Item> = items.values().cloned().collect();
        all.sort_by_key(|i| i.created_at);
        Ok(all)
    }

    async fn update(&self, item: Item) -> DomainResult<Item> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(item)
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn delete(&self, id: ItemId) -> DomainResult<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.remove(&id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let removed = items.len() as u64;
        items.clear();
        Ok(removed)
    }
}
