use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postgate_auth::{Capability, Role, UserAccount};
use postgate_blog::ItemDraft;
use postgate_core::{ItemId, UserId};

use crate::context::PrincipalContext;

// -------------------------
// Request DTOs
// -------------------------

/// Missing fields deserialize as empty so the presence check reports them.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub blogname: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

impl From<ItemRequest> for ItemDraft {
    fn from(req: ItemRequest) -> Self {
        ItemDraft::new(req.blogname, req.author, req.content)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub permissions: Vec<Capability>,
    pub expires_at: DateTime<Utc>,
}

impl From<&PrincipalContext> for WhoAmIResponse {
    fn from(ctx: &PrincipalContext) -> Self {
        Self {
            user_id: ctx.user_id(),
            username: ctx.username().to_string(),
            role: ctx.role(),
            permissions: ctx.principal().permissions().granted(),
            expires_at: ctx.expires_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: &'static str,
}

/// Path parameter parsing for item ids.
pub fn parse_item_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse()
        .map_err(crate::app::errors::domain_error_to_response)
}
