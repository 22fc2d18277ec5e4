//! Session registry: issue, resolve, revoke and sweep opaque session tokens.
//!
//! Session state machine: Active (between issue and expiry/revoke), then
//! Expired/Revoked, which is terminal. An expired session and an unknown
//! token are indistinguishable to callers of [`SessionRegistry::resolve`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use postgate_core::{DomainError, UserId};

use crate::{Principal, Role};

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Opaque, unguessable session token (256 bits, base64url).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    const ENTROPY_BYTES: usize = 32;

    /// Draw a fresh token from the OS CSPRNG.
    pub fn generate() -> Result<Self, SessionStoreError> {
        let mut buf = [0u8; Self::ENTROPY_BYTES];
        getrandom::getrandom(&mut buf)
            .map_err(|e| SessionStoreError::Unavailable(format!("entropy source: {e}")))?;
        Ok(Self(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf),
        ))
    }

    pub fn from_string(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn fingerprint(&self) -> &str {
        let end = self.0.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SessionToken({}…)", self.fingerprint())
    }
}

/// A live binding of a token to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub username: String,
    /// Role at issuance; later role changes do not affect live sessions.
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.username.clone(), self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of registry operations that can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown, revoked or expired token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The backing store could not answer. Never reported as `Unauthenticated`.
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionStoreError> for SessionError {
    fn from(value: SessionStoreError) -> Self {
        match value {
            SessionStoreError::Unavailable(msg) => SessionError::Unavailable(msg),
        }
    }
}

impl From<SessionError> for DomainError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Unauthenticated => DomainError::Unauthenticated,
            SessionError::Unavailable(msg) => DomainError::Unavailable(msg),
        }
    }
}

/// Keyed storage for sessions.
///
/// Implementations must be safe for concurrent use without a process-wide
/// lock. `remove_if_expired` and `remove_expired` are compare-and-delete on
/// the stored expiry: an entry whose stored expiry is still in the future
/// must survive them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> Result<(), SessionStoreError>;

    async fn get(&self, token: &SessionToken) -> Result<Option<Session>, SessionStoreError>;

    /// Returns whether an entry was present.
    async fn remove(&self, token: &SessionToken) -> Result<bool, SessionStoreError>;

    async fn remove_if_expired(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionStoreError>;

    /// Returns the number of entries removed.
    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError>;
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn insert(&self, session: Session) -> Result<(), SessionStoreError> {
        (**self).insert(session).await
    }

    async fn get(&self, token: &SessionToken) -> Result<Option<Session>, SessionStoreError> {
        (**self).get(token).await
    }

    async fn remove(&self, token: &SessionToken) -> Result<bool, SessionStoreError> {
        (**self).remove(token).await
    }

    async fn remove_if_expired(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionStoreError> {
        (**self).remove_if_expired(token, now).await
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError> {
        (**self).remove_expired(now).await
    }
}

/// Encapsulated session registry. The only way to create, look up or destroy
/// sessions.
pub struct SessionRegistry<S> {
    store: S,
    ttl: Duration,
}

impl<S> SessionRegistry<S>
where
    S: SessionStore,
{
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for `principal`, expiring `ttl` after `now`.
    pub async fn issue(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Unavailable("session expiry out of range".to_string()))?;
        let session = Session {
            token: SessionToken::generate()?,
            user_id: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            issued_at: now,
            expires_at,
        };
        self.store.insert(session.clone()).await?;

        tracing::info!(
            user_id = %session.user_id,
            role = %session.role,
            token = session.token.fingerprint(),
            expires_at = %session.expires_at,
            "session issued"
        );
        Ok(session)
    }

    /// Resolve `token` to its session.
    ///
    /// Absent and expired tokens both fail with `Unauthenticated`. An expired
    /// entry found here is removed on the way out.
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        if token.is_empty() {
            return Err(SessionError::Unauthenticated);
        }
        let token = SessionToken::from_string(token);

        let Some(session) = self.store.get(&token).await? else {
            return Err(SessionError::Unauthenticated);
        };

        if !session.is_active(now) {
            if let Err(e) = self.store.remove_if_expired(&token, now).await {
                tracing::warn!(token = token.fingerprint(), error = %e, "failed to drop expired session");
            }
            return Err(SessionError::Unauthenticated);
        }

        Ok(session)
    }

    /// Remove `token`. Unknown or already revoked tokens are not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        if token.is_empty() {
            return Ok(());
        }
        let token = SessionToken::from_string(token);
        let removed = self.store.remove(&token).await?;
        tracing::info!(token = token.fingerprint(), removed, "session revoked");
        Ok(())
    }

    /// Remove every session whose expiry is at or before `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        let removed = self.store.remove_expired(now).await?;
        tracing::debug!(removed, "session sweep finished");
        Ok(removed)
    }
}
