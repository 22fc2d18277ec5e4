//! Blog domain module.
//!
//! Holds the `Item` (a blog post) and the presence rules for drafts. Pure
//! domain logic: no IO, no HTTP, no storage.

pub mod item;

pub use item::{Item, ItemDraft};
