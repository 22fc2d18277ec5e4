//! Role → capability policy.
//!
//! The policy table lives in [`role_mask`] and nowhere else. Every other
//! query in this module (and the authorization gate) derives from it.

use serde::{Deserialize, Serialize};

use crate::Role;

/// One yes/no question the policy can answer about a role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// View ordinary (non-admin) content, including one's own items.
    View,
    /// View content flagged as admin-only.
    ViewAdminContent,
    Create,
    Update,
    Delete,
    /// See every user's items, not just one's own.
    ViewAll,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::ViewAdminContent,
        Capability::Create,
        Capability::Update,
        Capability::Delete,
        Capability::ViewAll,
    ];

    const fn bit(self) -> u8 {
        match self {
            Capability::View => 1,
            Capability::Create => 1 << 1,
            Capability::Update => 1 << 2,
            Capability::Delete => 1 << 3,
            Capability::ViewAll => 1 << 4,
            Capability::ViewAdminContent => 1 << 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::ViewAdminContent => "view_admin_content",
            Capability::Create => "create",
            Capability::Update => "update",
            Capability::Delete => "delete",
            Capability::ViewAll => "view_all",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn role_mask(role: Role) -> u8 {
    const VIEW: u8 = Capability::View.bit();
    const CREATE: u8 = Capability::Create.bit();
    const UPDATE: u8 = Capability::Update.bit();
    const DELETE: u8 = Capability::Delete.bit();
    const VIEW_ALL: u8 = Capability::ViewAll.bit();
    const VIEW_ADMIN: u8 = Capability::ViewAdminContent.bit();

    match role {
        Role::Admin => VIEW | VIEW_ADMIN | CREATE | UPDATE | DELETE | VIEW_ALL,
        Role::User => VIEW | CREATE | UPDATE,
        Role::Guest => VIEW,
    }
}

/// Does `role` hold `capability`?
pub fn evaluate(role: Role, capability: Capability) -> bool {
    role_mask(role) & capability.bit() != 0
}

/// Capability set of a role, derived on demand. Stateless and cheap to copy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PermissionView {
    role: Role,
}

impl PermissionView {
    pub fn for_role(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn can_view(&self, is_admin_content: bool) -> bool {
        evaluate(self.role, Capability::View)
            && (!is_admin_content || evaluate(self.role, Capability::ViewAdminContent))
    }

    pub fn can_create(&self) -> bool {
        evaluate(self.role, Capability::Create)
    }

    pub fn can_update(&self) -> bool {
        evaluate(self.role, Capability::Update)
    }

    pub fn can_delete(&self) -> bool {
        evaluate(self.role, Capability::Delete)
    }

    pub fn can_view_all(&self) -> bool {
        evaluate(self.role, Capability::ViewAll)
    }

    /// Capabilities granted, in [`Capability::ALL`] order.
    pub fn granted(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| evaluate(self.role, *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Expected answers, written out by hand as columns:
    /// view, view-admin-content, create, update, delete, view-all.
    fn expected(role: Role, capability: Capability) -> bool {
        let row: [bool; 6] = match role {
            Role::Admin => [true, true, true, true, true, true],
            Role::User => [true, false, true, true, false, false],
            Role::Guest => [true, false, false, false, false, false],
        };
        let col = match capability {
            Capability::View => 0,
            Capability::ViewAdminContent => 1,
            Capability::Create => 2,
            Capability::Update => 3,
            Capability::Delete => 4,
            Capability::ViewAll => 5,
        };
        row[col]
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn any_capability() -> impl Strategy<Value = Capability> {
        prop::sample::select(Capability::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn evaluate_matches_policy_table(role in any_role(), capability in any_capability()) {
            prop_assert_eq!(evaluate(role, capability), expected(role, capability));
        }

        #[test]
        fn admin_content_implies_plain_view(role in any_role()) {
            let view = PermissionView::for_role(role);
            prop_assert!(!view.can_view(true) || view.can_view(false));
        }
    }

    #[test]
    fn every_pair_is_checked_exhaustively() {
        for role in Role::ALL {
            for capability in Capability::ALL {
                assert_eq!(
                    evaluate(role, capability),
                    expected(role, capability),
                    "{role} / {capability}"
                );
            }
        }
    }

    #[test]
    fn permission_view_accessors_follow_table() {
        let user = PermissionView::for_role(Role::User);
        assert!(user.can_view(false));
        assert!(!user.can_view(true));
        assert!(user.can_create());
        assert!(user.can_update());
        assert!(!user.can_delete());
        assert!(!user.can_view_all());

        let guest = PermissionView::for_role(Role::Guest);
        assert_eq!(guest.granted(), vec![Capability::View]);

        let admin = PermissionView::for_role(Role::Admin);
        assert_eq!(admin.granted(), Capability::ALL.to_vec());
    }
}
