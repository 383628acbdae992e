//! Persistence boundary traits.
//!
//! Defines the contracts for durable pending-edit and conversation
//! storage, decoupling the session logic from the on-disk format.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::chat::Conversation;
use crate::edit::CodeEdit;

/// Durable store for the pending-edit set.
///
/// The full set is serialized as one snapshot; single-edit operations are
/// load-mutate-save over the whole file. Acceptable because the pending
/// set is small (human-reviewed edits, not a high-volume log).
#[async_trait]
pub trait EditStore: Send + Sync {
    /// Overwrites the snapshot with the given set (last-writer-wins).
    /// Scratch file paths are session-local and never serialized.
    async fn save_all(&self, edits: &[CodeEdit]) -> Result<()>;

    /// Loads the persisted set. A missing or unreadable/corrupt file
    /// yields an empty set; pending edits are a convenience, not critical
    /// data, so corruption is logged and swallowed here.
    async fn load_all(&self) -> Vec<CodeEdit>;

    /// Adds or replaces a single edit by id.
    async fn upsert(&self, edit: &CodeEdit) -> Result<()>;

    /// Removes a single edit by id. Removing an unknown id is a no-op.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Deletes the backing file.
    async fn clear(&self) -> Result<()>;
}

/// Durable archive of full conversation transcripts.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Write-through save keyed by conversation id, bumping
    /// `last_modified`.
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Loads all conversations ordered by `last_modified` descending.
    /// Corrupt individual files are skipped (logged), not fatal.
    async fn load_all(&self) -> Result<Vec<Conversation>>;

    /// Loads one conversation by id; `None` when absent or unreadable.
    async fn load(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Deletes a conversation. Deleting a missing id is a no-op.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Renders a conversation to a readable transcript document at
    /// `destination`. Failures propagate: export is an explicit user
    /// action expecting feedback, unlike the silent-degrade policy above.
    async fn export_to_markdown(&self, conversation: &Conversation, destination: &Path)
    -> Result<()>;
}
