use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::Response,
};
use chrono::{DateTime, Utc};

use postgate_auth::{Principal, Role, Session, SessionToken};
use postgate_core::UserId;

use crate::app::errors;

/// Principal context for a request: the resolved session that admitted it.
///
/// Inserted by the gate middleware; handlers never re-resolve the token.
/// Extracting it on a route the gate does not cover is a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    username: String,
    role: Role,
    token: SessionToken,
    expires_at: DateTime<Utc>,
}

impl PrincipalContext {
    pub fn from_session(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            username: session.username,
            role: session.role,
            token: session.token,
            expires_at: session.expires_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.username.clone(), self.role)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PrincipalContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<PrincipalContext>().cloned().ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "no principal context on request");
            errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        })
    }
}
