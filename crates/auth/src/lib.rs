//! `postgate-auth`: authentication and authorization core.
//!
//! Sessions, roles, the permission policy and the authorization gate. This
//! crate is decoupled from HTTP and from concrete storage: stores are traits
//! implemented in `postgate-infra`.

pub mod authorize;
pub mod credentials;
pub mod login;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;

pub use authorize::{authorize, AuthorizationGate, AuthzError, Requirement};
pub use credentials::{CredentialStore, UserAccount};
pub use login::{Authenticator, LoginError, LoginPolicy};
pub use permissions::{evaluate, Capability, PermissionView};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use session::{
    Session, SessionError, SessionRegistry, SessionStore, SessionStoreError, SessionToken,
    DEFAULT_SESSION_TTL_SECS,
};
