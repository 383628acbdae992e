//! Sidekick infrastructure: durable storage and host-side plumbing.
//!
//! JSON pending-edit store, JSON conversation archive with markdown
//! export, TOML settings, unified path resolution, and scratch-file
//! materialization for external diff viewers.

pub mod json_conversation_archive;
pub mod json_edit_store;
pub mod paths;
pub mod scratch;
pub mod settings;

pub use crate::json_conversation_archive::JsonConversationArchive;
pub use crate::json_edit_store::JsonEditStore;
pub use crate::paths::SidekickPaths;
pub use crate::scratch::ScratchMaterializer;
pub use crate::settings::{Settings, SettingsStore};
