//! `postgate-core`: domain foundation shared by every other crate.
//!
//! Typed identifiers and the error taxonomy. No IO lives here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, UserId};
