use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use postgate_auth::{Session, SessionStore, SessionStoreError, SessionToken};

const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<SessionToken, Session>>;

/// Sharded in-memory session store.
///
/// Each shard has its own lock, so unrelated tokens never contend and no
/// operation takes a store-wide lock. Sweeps lock one shard at a time.
#[derive(Debug)]
pub struct InMemorySessionStore {
    shards: Vec<Shard>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    /// Number of stored entries, live or not yet swept.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().map(|m| m.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard(&self, token: &SessionToken) -> &Shard {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> SessionStoreError {
    SessionStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), SessionStoreError> {
        let mut shard = self.shard(&session.token).write().map_err(|_| poisoned())?;
        shard.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get(&self, token: &SessionToken) -> Result<Option<Session>, SessionStoreError> {
        let shard = self.shard(token).read().map_err(|_| poisoned())?;
        Ok(shard.get(token).cloned())
    }

    async fn remove(&self, token: &SessionToken) -> Result<bool, SessionStoreError> {
        let mut shard = self.shard(token).write().map_err(|_| poisoned())?;
        Ok(shard.remove(token).is_some())
    }

    async fn remove_if_expired(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionStoreError> {
        let mut shard = self.shard(token).write().map_err(|_| poisoned())?;
        // Re-check under the write lock: the entry may have been replaced.
        match shard.get(token) {
            Some(session) if !session.is_active(now) => Ok(shard.remove(token).is_some()),
            _ => Ok(false),
        }
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError> {
        let mut removed = 0;
        for shard in &self.shards {
            let mut map = shard.write().map_err(|_| poisoned())?;
            let before = map.len();
            map.retain(|_, session| session.is_active(now));
            removed += before - map.len();
        }
        Ok(removed)
    }
}
