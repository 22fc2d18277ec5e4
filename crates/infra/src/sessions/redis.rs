//! Redis-backed session store.
//!
//! Each session is one key, `session:<token>`, holding a JSON entry and a
//! key TTL equal to the session's remaining lifetime. Redis expiry does the
//! bulk of the sweeping; `remove_expired` only catches entries whose key TTL
//! and stored expiry disagree (clock skew).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};

use postgate_auth::{Session, SessionStore, SessionStoreError, SessionToken};

const DEFAULT_PREFIX: &str = "session:";

/// Atomic compare-and-delete on the stored expiry.
const REMOVE_IF_EXPIRED_LUA: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return 0 end
local entry = cjson.decode(raw)
if tonumber(entry['expires_at_ms']) <= tonumber(ARGV[1]) then
  return redis.call('DEL', KEYS[1])
end
return 0
"#;

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    /// Duplicated from the session so the Lua script can compare it.
    expires_at_ms: i64,
    session: Session,
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    prefix: String,
}

fn unavailable(e: impl core::fmt::Display) -> SessionStoreError {
    SessionStoreError::Unavailable(e.to_string())
}

impl RedisSessionStore {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self {
            conn,
            prefix: DEFAULT_PREFIX.to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, token: &SessionToken) -> String {
        format!("{}{}", self.prefix, token.as_str())
    }

    async fn remove_key_if_expired(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::Script::new(REMOVE_IF_EXPIRED_LUA)
            .key(key)
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn insert(&self, session: Session) -> Result<(), SessionStoreError> {
        let ttl_ms = (session.expires_at - session.issued_at).num_milliseconds().max(1) as u64;
        let key = self.key(&session.token);
        let entry = StoredEntry {
            expires_at_ms: session.expires_at.timestamp_millis(),
            session,
        };
        let payload = serde_json::to_string(&entry).map_err(unavailable)?;

        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, payload, ttl_ms)
            .await
            .map_err(unavailable)
    }

    async fn get(&self, token: &SessionToken) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.key(token)).await.map_err(unavailable)?;
        match raw {
            Some(raw) => {
                let entry: StoredEntry = serde_json::from_str(&raw).map_err(unavailable)?;
                Ok(Some(entry.session))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, token: &SessionToken) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.key(token)).await.map_err(unavailable)?;
        Ok(removed > 0)
    }

    async fn remove_if_expired(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionStoreError> {
        self.remove_key_if_expired(&self.key(token), now).await
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError> {
        let mut keys: Vec<String> = Vec::new();
        {
            let mut conn = self.conn.clone();
            let mut iter: redis::AsyncIter<String> = conn
                .scan_match(format!("{}*", self.prefix))
                .await
                .map_err(unavailable)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut removed = 0;
        for key in keys {
            if self.remove_key_if_expired(&key, now).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
