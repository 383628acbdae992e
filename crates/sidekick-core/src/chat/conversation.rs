//! Conversation domain model.
//!
//! A conversation is the full record of one chat session: metadata plus the
//! ordered message transcript. It is persisted write-through by the
//! conversation archive after every turn.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::ChatMessage;
use crate::mode::InteractionMode;

/// A full session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// Human-readable conversation title.
    pub title: String,
    /// Timestamp when the conversation was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the conversation was last modified (ISO 8601 format).
    pub last_modified: String,
    /// The model used in this conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// The interaction mode the conversation was held in.
    #[serde(default)]
    pub mode: InteractionMode,
    /// All messages, in order.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Estimated total tokens used.
    #[serde(default)]
    pub tokens_used: u32,
    /// User-defined tags for categorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Conversation {
    /// Creates an empty conversation with a fresh id and the default title.
    pub fn new(mode: InteractionMode) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4(),
            title: "New Conversation".to_string(),
            created_at: now.clone(),
            last_modified: now,
            model: None,
            mode,
            messages: Vec::new(),
            tokens_used: 0,
            tags: Vec::new(),
        }
    }

    /// Appends a message and bumps `last_modified` and the token estimate.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.tokens_used += crate::context::estimate_tokens(&message.content);
        self.messages.push(message);
        self.touch();
    }

    /// Bumps `last_modified` to now.
    pub fn touch(&mut self) {
        self.last_modified = chrono::Utc::now().to_rfc3339();
    }

    /// Derives a title from the first user message, truncated for display.
    /// Keeps the default title while the conversation is empty.
    pub fn derive_title(&mut self) {
        if let Some(first) = self.messages.iter().find(|m| m.is_user) {
            let mut title: String = first.content.chars().take(48).collect();
            if first.content.chars().count() > 48 {
                title.push('…');
            }
            self.title = title;
        }
    }
}
