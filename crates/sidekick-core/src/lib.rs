//! Sidekick core: domain models and boundary traits for the
//! IDE-integrated assistant.
//!
//! This crate holds everything the session engine reasons about — chat
//! messages and conversations, context references and assembly, code edit
//! proposals, the mode & pending-edit tracker — plus the traits the engine
//! consumes from its collaborators (editor access, code search, inference,
//! persistence). Concrete implementations live in the sibling crates.

pub mod chat;
pub mod context;
pub mod edit;
pub mod editor;
pub mod error;
pub mod inference;
pub mod mode;
pub mod repository;
pub mod search;

// Re-export common error type
pub use error::{Result, SidekickError};
