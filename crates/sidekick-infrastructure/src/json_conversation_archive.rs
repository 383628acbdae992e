//! JSON-file ConversationRepository implementation.
//!
//! Directory structure:
//! ```text
//! base_dir/
//! ├── <conversation-id-1>.json
//! └── <conversation-id-2>.json
//! ```
//!
//! Saves are write-through: one pretty-printed JSON file per conversation,
//! rewritten after every turn. Null-valued fields are omitted on write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use sidekick_core::chat::Conversation;
use sidekick_core::repository::ConversationRepository;

use crate::paths::SidekickPaths;

/// Conversation archive storing one JSON file per conversation.
pub struct JsonConversationArchive {
    base_dir: PathBuf,
}

impl JsonConversationArchive {
    /// Creates an archive rooted at `base_dir`, creating the directory if
    /// needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).context("Failed to create history directory")?;
        Ok(Self { base_dir })
    }

    /// Creates an archive at the default per-user history location.
    pub fn default_location() -> Result<Self> {
        let history_dir = SidekickPaths::history_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get history directory: {}", e))?;
        Self::new(history_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn conversation_file(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    /// Number of archived conversations (0 on any error).
    pub fn conversation_count(&self) -> usize {
        std::fs::read_dir(&self.base_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Deletes all archived conversations, best-effort.
    pub async fn clear_all(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .context("Failed to read history directory")?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Err(e) = fs::remove_file(&path).await {
                    tracing::warn!("failed to delete {}: {e}", path.display());
                }
            }
        }
        Ok(())
    }

    fn render_markdown(conversation: &Conversation) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", conversation.title));
        out.push_str(&format!("**Created:** {}\n", conversation.created_at));
        out.push_str(&format!("**Last Modified:** {}\n", conversation.last_modified));
        if let Some(model) = &conversation.model {
            out.push_str(&format!("**Model:** {model}\n"));
        }
        out.push_str(&format!("**Mode:** {}\n", conversation.mode));
        out.push_str(&format!("**Messages:** {}\n", conversation.messages.len()));
        if !conversation.tags.is_empty() {
            out.push_str(&format!("**Tags:** {}\n", conversation.tags.join(", ")));
        }
        out.push_str("\n---\n\n");

        for message in &conversation.messages {
            let role = if message.is_user { "You" } else { "Assistant" };
            out.push_str(&format!("## {role}\n\n{}\n\n", message.content));
            if message.has_code_blocks {
                out.push_str(&format!(
                    "*({} code block(s))*\n\n",
                    message.code_blocks.len()
                ));
            }
        }

        out
    }
}

#[async_trait]
impl ConversationRepository for JsonConversationArchive {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let mut record = conversation.clone();
        record.touch();

        let json = serde_json::to_string_pretty(&record)
            .context("Failed to serialize conversation")?;
        fs::write(self.conversation_file(record.id), json)
            .await
            .context("Failed to write conversation file")?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();

        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .context("Failed to read history directory")?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            match fs::read_to_string(&path).await {
                Ok(json) => match serde_json::from_str::<Conversation>(&json) {
                    Ok(conversation) => conversations.push(conversation),
                    Err(e) => {
                        tracing::warn!("skipping corrupt conversation {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("skipping unreadable conversation {}: {e}", path.display());
                }
            }
        }

        // Most recent first.
        conversations.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(conversations)
    }

    async fn load(&self, id: Uuid) -> Result<Option<Conversation>> {
        let path = self.conversation_file(id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read conversation file"),
        };

        match serde_json::from_str(&json) {
            Ok(conversation) => Ok(Some(conversation)),
            Err(e) => {
                tracing::warn!("corrupt conversation {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        match fs::remove_file(self.conversation_file(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete conversation file"),
        }
    }

    async fn export_to_markdown(
        &self,
        conversation: &Conversation,
        destination: &Path,
    ) -> Result<()> {
        let markdown = Self::render_markdown(conversation);
        fs::write(destination, markdown)
            .await
            .with_context(|| format!("Failed to export conversation to {}", destination.display()))
    }
}
