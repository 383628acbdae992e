//! Chat message types.
//!
//! This module contains types for representing a single turn of the
//! transcript, including the fenced code regions extracted from it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fenced code region found inside a chat message.
///
/// The character offsets point into the original message text and are used
/// to strip the region from the prose-only rendering. A block is always
/// owned by exactly one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag from the opening fence (`"text"` when absent).
    pub language: String,
    /// The code between the fences.
    pub code: String,
    /// Byte offset of the opening fence in the original message.
    pub start_offset: usize,
    /// Byte offset one past the closing fence in the original message.
    pub end_offset: usize,
}

impl CodeBlock {
    pub fn new(
        language: impl Into<String>,
        code: impl Into<String>,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            start_offset,
            end_offset,
        }
    }
}

/// One turn of the conversation transcript.
///
/// Messages are created at parse time from raw text (user input or model
/// output) and are immutable once added to a transcript. The streaming
/// variant used while a response is in flight appends to `content`
/// incrementally and is then frozen by re-parsing the full text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The message text.
    pub content: String,
    /// Whether the message was authored by the user (false = assistant).
    pub is_user: bool,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
    /// Name of the model that produced an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Whether any fenced code blocks were extracted.
    #[serde(default)]
    pub has_code_blocks: bool,
    /// The extracted code blocks, in document order.
    #[serde(default)]
    pub code_blocks: Vec<CodeBlock>,
    /// The code edit proposed from this message, if one was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_id: Option<Uuid>,
}

impl ChatMessage {
    /// Creates a message with the current timestamp and no extracted blocks.
    pub fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            content: content.into(),
            is_user,
            timestamp: chrono::Utc::now().to_rfc3339(),
            model_name: None,
            has_code_blocks: false,
            code_blocks: Vec::new(),
            edit_id: None,
        }
    }

    /// True iff this is an assistant message carrying at least one code
    /// block, i.e. a message an edit could be extracted from.
    pub fn is_actionable(&self) -> bool {
        !self.is_user && self.has_code_blocks
    }
}
