//! Credential store contract.
//!
//! The store exclusively owns user records. Implementations live in
//! `postgate-infra`; this crate only depends on the trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use postgate_core::{DomainResult, UserId};

use crate::{Principal, Role};

/// A stored user account.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    /// Unique, compared case-sensitively.
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.role)
    }
}

// The digest is omitted so accounts can be logged freely.
impl core::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Lookup and creation of user accounts.
///
/// Errors: `NotFound` for an unknown username, `Conflict` when creating a
/// username that already exists, `Unavailable` for backend failures.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> DomainResult<UserAccount>;

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> DomainResult<UserAccount>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_by_username(&self, username: &str) -> DomainResult<UserAccount> {
        (**self).find_by_username(username).await
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> DomainResult<UserAccount> {
        (**self).create(username, password_hash, role).await
    }
}
