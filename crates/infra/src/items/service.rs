//! Cached item service.
//!
//! Reads are read-through against the [`ResourceCache`]. Writes run the
//! storage call and the matching invalidations in a spawned task which the
//! caller awaits, so a dropped request future cannot leave a write committed
//! with its cache entries still live.
//!
//! Every write drops its keys twice: before touching storage, where a cache
//! failure aborts the write with `Unavailable`, and again after it, to clear
//! anything a concurrent read cached in between.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use postgate_auth::Principal;
use postgate_blog::{Item, ItemDraft};
use postgate_core::{DomainError, DomainResult, ItemId, UserId};

use super::ItemRepository;
use crate::cache::{ALL_ITEMS_KEY, DEFAULT_CACHE_TTL, ResourceCache, item_key};

/// Which items a caller may see. Out-of-scope items read as `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(UserId),
}

impl Scope {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.permissions().can_view_all() {
            Scope::All
        } else {
            Scope::Owner(principal.user_id)
        }
    }

    pub fn permits(&self, item: &Item) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(owner) => item.is_owned_by(*owner),
        }
    }
}

pub struct ItemService<R: ?Sized, C: ?Sized> {
    repo: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R: ?Sized, C: ?Sized> Clone for ItemService<R, C> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<R, C> ItemService<R, C>
where
    R: ItemRepository + ?Sized + 'static,
    C: ResourceCache + ?Sized + 'static,
{
    pub fn new(repo: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            repo,
            cache,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    pub async fn get(&self, id: ItemId, scope: Scope) -> DomainResult<Item> {
        let item = self.load_item(id).await?;
        if !scope.permits(&item) {
            return Err(DomainError::NotFound);
        }
        Ok(item)
    }

    pub async fn list(&self, scope: Scope) -> DomainResult<Vec<Item>> {
        match scope {
            Scope::All => self.list_all().await,
            Scope::Owner(owner) => self.list_owned(owner).await,
        }
    }

    pub async fn list_all(&self) -> DomainResult<Vec<Item>> {
        if let Some(items) = self.cached::<Vec<Item>>(ALL_ITEMS_KEY).await {
            return Ok(items);
        }
        let items = self.repo.list().await?;
        self.populate(ALL_ITEMS_KEY, &items).await;
        Ok(items)
    }

    pub async fn list_owned(&self, owner: UserId) -> DomainResult<Vec<Item>> {
        let mut items = self.list_all().await?;
        items.retain(|item| item.is_owned_by(owner));
        Ok(items)
    }

    async fn load_item(&self, id: ItemId) -> DomainResult<Item> {
        let key = item_key(id);
        if let Some(item) = self.cached::<Item>(&key).await {
            return Ok(item);
        }
        let item = self.repo.get_by_id(id).await?;
        self.populate(&key, &item).await;
        Ok(item)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                    let _ = self.cache.invalidate(key).await;
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; falling back to storage");
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw, self.ttl).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create(
        &self,
        owner: UserId,
        draft: ItemDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Item> {
        let item = Item::create(owner, draft, now)?;
        let (repo, cache) = self.handles();

        detached(async move {
            let keys = [item_key(item.id), ALL_ITEMS_KEY.to_string()];
            invalidate(&*cache, &keys).await?;
            let created = repo.create(item).await?;
            reinvalidate(&*cache, &keys).await;
            tracing::info!(item_id = %created.id, owner_id = %created.owner_id, "item created");
            Ok(created)
        })
        .await
    }

    pub async fn update(
        &self,
        id: ItemId,
        draft: ItemDraft,
        scope: Scope,
        now: DateTime<Utc>,
    ) -> DomainResult<Item> {
        draft.validate()?;
        let (repo, cache) = self.handles();

        detached(async move {
            let mut item = repo.get_by_id(id).await?;
            if !scope.permits(&item) {
                return Err(DomainError::NotFound);
            }
            item.apply_draft(draft, now)?;
            let keys = [item_key(id), ALL_ITEMS_KEY.to_string()];
            invalidate(&*cache, &keys).await?;
            let updated = repo.update(item).await?;
            reinvalidate(&*cache, &keys).await;
            tracing::info!(item_id = %id, "item updated");
            Ok(updated)
        })
        .await
    }

    pub async fn delete(&self, id: ItemId, scope: Scope) -> DomainResult<()> {
        let (repo, cache) = self.handles();

        detached(async move {
            if scope != Scope::All {
                let item = repo.get_by_id(id).await?;
                if !scope.permits(&item) {
                    return Err(DomainError::NotFound);
                }
            }
            let keys = [item_key(id), ALL_ITEMS_KEY.to_string()];
            invalidate(&*cache, &keys).await?;
            repo.delete(id).await?;
            reinvalidate(&*cache, &keys).await;
            tracing::info!(item_id = %id, "item deleted");
            Ok(())
        })
        .await
    }

    /// Returns the number of items removed.
    pub async fn delete_all(&self) -> DomainResult<u64> {
        let (repo, cache) = self.handles();

        detached(async move {
            // Ids are collected first so every per-item key can be dropped.
            let ids: Vec<ItemId> = repo.list().await?.into_iter().map(|i| i.id).collect();
            let mut keys: Vec<String> = ids.into_iter().map(item_key).collect();
            keys.push(ALL_ITEMS_KEY.to_string());

            invalidate(&*cache, &keys).await?;
            let removed = repo.delete_all().await?;
            reinvalidate(&*cache, &keys).await;

            tracing::info!(removed, "all items deleted");
            Ok(removed)
        })
        .await
    }

    fn handles(&self) -> (Arc<R>, Arc<C>) {
        (Arc::clone(&self.repo), Arc::clone(&self.cache))
    }
}

/// Drop `keys` ahead of a write. Any failure aborts the write.
async fn invalidate<C: ResourceCache + ?Sized>(cache: &C, keys: &[String]) -> DomainResult<()> {
    for key in keys {
        if let Err(e) = cache.invalidate(key).await {
            tracing::warn!(key = %key, error = %e, "cache invalidation failed; write aborted");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Drop `keys` again once the write is visible. The write has committed by
/// now, so failures are only logged.
async fn reinvalidate<C: ResourceCache + ?Sized>(cache: &C, keys: &[String]) {
    for key in keys {
        if let Err(e) = cache.invalidate(key).await {
            tracing::warn!(key = %key, error = %e, "post-write cache invalidation failed");
        }
    }
}

/// Run `fut` on its own task and wait for it.
async fn detached<T, F>(fut: F) -> DomainResult<T>
where
    T: Send + 'static,
    F: Future<Output = DomainResult<T>> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| DomainError::unavailable(format!("write task failed: {e}")))?
}
