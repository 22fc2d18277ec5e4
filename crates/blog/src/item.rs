use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postgate_core::{DomainError, DomainResult, ItemId, UserId};

/// A blog post.
///
/// `id` and `owner_id` never change after creation; everything else is
/// replaced wholesale by [`Item::apply_draft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub blogname: String,
    pub author: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields of an item, as received on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub blogname: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

impl ItemDraft {
    pub fn new(
        blogname: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            blogname: blogname.into(),
            author: author.into(),
            content: content.into(),
        }
    }

    /// Presence checks only: `blogname` and `author` must be non-blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.blogname.trim().is_empty() || self.author.trim().is_empty() {
            return Err(DomainError::invalid_input("blogname and author are required"));
        }
        Ok(())
    }
}

impl Item {
    /// Build a new item owned by `owner_id` from a validated draft.
    pub fn create(owner_id: UserId, draft: ItemDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: ItemId::new(),
            owner_id,
            blogname: draft.blogname,
            author: draft.author,
            content: draft.content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields. Identity and ownership are preserved.
    pub fn apply_draft(&mut self, draft: ItemDraft, now: DateTime<Utc>) -> DomainResult<()> {
        draft.validate()?;
        self.blogname = draft.blogname;
        self.author = draft.author;
        self.content = draft.content;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}
