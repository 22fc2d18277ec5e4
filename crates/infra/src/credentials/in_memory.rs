use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use postgate_auth::{CredentialStore, Role, UserAccount};
use postgate_core::{DomainError, DomainResult};

/// In-memory credential store for tests/dev. Keyed by exact username.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("credential store lock poisoned")
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> DomainResult<UserAccount> {
        let users = self.users.read().map_err(|_| poisoned())?;
        users.get(username).cloned().ok_or(DomainError::NotFound)
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> DomainResult<UserAccount> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.contains_key(username) {
            return Err(DomainError::conflict(format!("username '{username}' exists")));
        }
        let account = UserAccount::new(username, password_hash, role);
        users.insert(username.to_string(), account.clone());
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.create("alice", "digest", Role::User).await.unwrap();
        let found = store.find_by_username("alice").await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.create("alice", "digest", Role::User).await.unwrap();
        let err = store.create("alice", "other", Role::Admin).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.find_by_username("alice").await.unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = InMemoryCredentialStore::new();
        store.create("Alice", "digest", Role::User).await.unwrap();
        assert_eq!(store.find_by_username("alice").await.unwrap_err(), DomainError::NotFound);
        assert!(store.create("alice", "digest", Role::User).await.is_ok());
    }
}
