//! Authorization gate: session resolution + policy check in one place.
//!
//! Transport-agnostic. The HTTP layer extracts the token and maps
//! [`AuthzError`] to status codes; everything in between happens here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use postgate_core::DomainError;

use crate::{Capability, Principal, Role, Session, SessionError, SessionRegistry, SessionStore};

/// What a protected operation demands of its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub capability: Capability,
    /// The operation touches admin-only content; the role must also hold
    /// [`Capability::ViewAdminContent`].
    pub admin_only: bool,
}

impl Requirement {
    pub const fn new(capability: Capability) -> Self {
        Self {
            capability,
            admin_only: false,
        }
    }

    pub const fn admin_only(capability: Capability) -> Self {
        Self {
            capability,
            admin_only: true,
        }
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.admin_only {
            write!(f, "{} (admin-only)", self.capability)
        } else {
            write!(f, "{}", self.capability)
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: role '{role}' lacks '{requirement}'")]
    Forbidden { role: Role, requirement: Requirement },

    #[error("authorization backend unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionError> for AuthzError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Unauthenticated => AuthzError::Unauthenticated,
            SessionError::Unavailable(msg) => AuthzError::Unavailable(msg),
        }
    }
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => DomainError::Unauthenticated,
            AuthzError::Forbidden { .. } => DomainError::Forbidden,
            AuthzError::Unavailable(msg) => DomainError::Unavailable(msg),
        }
    }
}

/// Pure policy check of a principal against a requirement.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, requirement: &Requirement) -> Result<(), AuthzError> {
    let view = principal.permissions();
    let granted = crate::evaluate(principal.role, requirement.capability)
        && (!requirement.admin_only || view.can_view(true));

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            requirement: *requirement,
        })
    }
}

/// Composes the session registry with the policy.
///
/// The gate only reads: it never creates, extends or revokes sessions.
pub struct AuthorizationGate<S> {
    registry: Arc<SessionRegistry<S>>,
}

impl<S> Clone for AuthorizationGate<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<S> AuthorizationGate<S>
where
    S: SessionStore,
{
    pub fn new(registry: Arc<SessionRegistry<S>>) -> Self {
        Self { registry }
    }

    /// Admit the holder of `token` for `requirement`, or explain why not.
    ///
    /// A missing token, an unknown token and an expired token all yield
    /// `Unauthenticated`.
    pub async fn admit(
        &self,
        token: Option<&str>,
        requirement: Requirement,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthzError> {
        let token = token.ok_or(AuthzError::Unauthenticated)?;
        let session = self.registry.resolve(token, now).await?;

        if let Err(e) = authorize(&session.principal(), &requirement) {
            tracing::info!(
                user_id = %session.user_id,
                role = %session.role,
                requirement = %requirement,
                "request denied"
            );
            return Err(e);
        }

        Ok(session)
    }
}
