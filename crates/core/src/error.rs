//! Domain error model.

use thiserror::Error;

/// Result type used across the workspace.
pub type DomainResult<T> = Result<T, DomainError>;

/// The single error taxonomy every component error converts into.
///
/// The HTTP layer maps each variant to exactly one status code, so adding a
/// variant here is a wire-visible change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed request body, identifier or missing required field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing, expired or unknown session.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated, but the role lacks the capability.
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    /// Duplicate create.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or cache backend failure (including timeouts).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Short machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
        }
    }
}
