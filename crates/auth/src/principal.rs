use serde::{Deserialize, Serialize};

use postgate_core::UserId;

use crate::{PermissionView, Role};

/// An authenticated identity, as seen by authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn permissions(&self) -> PermissionView {
        PermissionView::for_role(self.role)
    }
}
