//! Code edit domain model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scratch files materializing an edit for an external diff viewer.
///
/// Session-local only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPair {
    /// Temp file holding the original text.
    pub original_path: PathBuf,
    /// Temp file holding the proposed text.
    pub modified_path: PathBuf,
}

/// A proposed modification to a specific file, suggested by the model.
///
/// An edit is resolved once `applied` is set or once it is removed from the
/// pending set; at most one resolution (apply vs. discard) may succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEdit {
    /// Unique edit identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Target file path; `None` means "the active document" at apply time.
    pub file_path: Option<PathBuf>,
    /// The text the edit replaces.
    pub original_code: String,
    /// The proposed replacement text.
    pub modified_code: String,
    /// Optional target line range.
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
    /// Human-readable description of the change.
    #[serde(default)]
    pub description: String,
    /// Timestamp when the edit was created (ISO 8601 format).
    pub created_at: String,
    /// Whether the edit has been applied to a document.
    #[serde(default)]
    pub applied: bool,
    /// Scratch files backing an external diff view (session-local).
    #[serde(skip)]
    pub scratch: Option<ScratchPair>,
}

impl CodeEdit {
    pub fn new(
        file_path: Option<PathBuf>,
        original_code: impl Into<String>,
        modified_code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path,
            original_code: original_code.into(),
            modified_code: modified_code.into(),
            start_line: None,
            end_line: None,
            description: description.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            applied: false,
            scratch: None,
        }
    }
}
