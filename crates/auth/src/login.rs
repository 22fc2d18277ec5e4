//! Login, registration and logout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use postgate_core::DomainError;

use crate::password::{self, PasswordError};
use crate::{CredentialStore, Role, Session, SessionError, SessionRegistry, SessionStore, UserAccount};

/// How unknown usernames are treated at login.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Create an account on first login instead of rejecting it.
    pub auto_register: bool,
    /// Role given to self-registered accounts.
    pub default_role: Role,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            auto_register: true,
            default_role: Role::User,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown user or wrong password; deliberately not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("username already taken")]
    UsernameTaken,

    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionError> for LoginError {
    fn from(value: SessionError) -> Self {
        match value {
            // A session we just issued cannot be unauthenticated; treat it as a backend fault.
            SessionError::Unauthenticated => LoginError::Unavailable("session not stored".into()),
            SessionError::Unavailable(msg) => LoginError::Unavailable(msg),
        }
    }
}

impl From<PasswordError> for LoginError {
    fn from(value: PasswordError) -> Self {
        LoginError::Unavailable(value.to_string())
    }
}

impl From<LoginError> for DomainError {
    fn from(value: LoginError) -> Self {
        match value {
            LoginError::InvalidInput(msg) => DomainError::InvalidInput(msg),
            LoginError::InvalidCredentials => DomainError::Unauthenticated,
            LoginError::UsernameTaken => DomainError::conflict("username already taken"),
            LoginError::Unavailable(msg) => DomainError::Unavailable(msg),
        }
    }
}

/// Composes credential lookup, password verification and session issuance.
pub struct Authenticator<C, S> {
    credentials: C,
    sessions: Arc<SessionRegistry<S>>,
    policy: LoginPolicy,
}

impl<C, S> Authenticator<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    pub fn new(credentials: C, sessions: Arc<SessionRegistry<S>>, policy: LoginPolicy) -> Self {
        Self {
            credentials,
            sessions,
            policy,
        }
    }

    pub fn policy(&self) -> LoginPolicy {
        self.policy
    }

    /// Authenticate and issue a session.
    ///
    /// Failures for unknown users and wrong passwords are the same
    /// `InvalidCredentials` value and cost one Argon2 verification each.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, LoginError> {
        require_present(username, password)?;

        let account = match self.credentials.find_by_username(username).await {
            Ok(account) => {
                self.check_password(password, &account.password_hash).await?;
                account
            }
            Err(DomainError::NotFound) if self.policy.auto_register => {
                self.register_on_first_login(username, password).await?
            }
            Err(DomainError::NotFound) => {
                // Burn the same verification cost as a real account.
                let _ = verify_blocking(password, password::dummy_digest()).await;
                tracing::info!("login rejected");
                return Err(LoginError::InvalidCredentials);
            }
            Err(e) => return Err(LoginError::Unavailable(e.to_string())),
        };

        let session = self.sessions.issue(&account.principal(), now).await?;
        Ok(session)
    }

    /// Explicitly create an account with the given role.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserAccount, LoginError> {
        require_present(username, password)?;

        let digest = hash_blocking(password).await?;
        let account = match self.credentials.create(username, &digest, role).await {
            Ok(account) => account,
            Err(DomainError::Conflict(_)) => return Err(LoginError::UsernameTaken),
            Err(e) => return Err(LoginError::Unavailable(e.to_string())),
        };

        tracing::info!(user_id = %account.id, role = %account.role, "account registered");
        Ok(account)
    }

    pub async fn logout(&self, token: &str) -> Result<(), LoginError> {
        self.sessions.revoke(token).await?;
        Ok(())
    }

    async fn register_on_first_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserAccount, LoginError> {
        match self.register(username, password, self.policy.default_role).await {
            Ok(account) => Ok(account),
            // Lost a race with a concurrent first login for the same name.
            Err(LoginError::UsernameTaken) => {
                let account = self
                    .credentials
                    .find_by_username(username)
                    .await
                    .map_err(|e| match e {
                        DomainError::NotFound => LoginError::InvalidCredentials,
                        other => LoginError::Unavailable(other.to_string()),
                    })?;
                self.check_password(password, &account.password_hash).await?;
                Ok(account)
            }
            Err(e) => Err(e),
        }
    }

    async fn check_password(&self, password: &str, digest: &str) -> Result<(), LoginError> {
        if verify_blocking(password, digest).await? {
            Ok(())
        } else {
            tracing::info!("login rejected");
            Err(LoginError::InvalidCredentials)
        }
    }
}

fn require_present(username: &str, password: &str) -> Result<(), LoginError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(LoginError::InvalidInput(
            "username and password are required".into(),
        ));
    }
    Ok(())
}

// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_blocking(password: &str) -> Result<String, LoginError> {
    let password = password.to_owned();
    let digest = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| LoginError::Unavailable(e.to_string()))??;
    Ok(digest)
}

async fn verify_blocking(password: &str, digest: &str) -> Result<bool, LoginError> {
    let password = password.to_owned();
    let digest = digest.to_owned();
    tokio::task::spawn_blocking(move || password::verify_password(&password, &digest))
        .await
        .map_err(|e| LoginError::Unavailable(e.to_string()))
}
