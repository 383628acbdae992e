//! Context reference types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::estimate_tokens;

/// The kind of item a context reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextKind {
    /// A file from the solution.
    File,
    /// The current editor selection.
    Selection,
    /// A specific method.
    Method,
    /// A specific class.
    Class,
    /// The entire solution.
    Solution,
    /// A specific project.
    Project,
}

impl ContextKind {
    /// Display label for context block headers.
    pub fn label(&self) -> &'static str {
        match self {
            ContextKind::File => "File",
            ContextKind::Selection => "Selection",
            ContextKind::Method => "Method",
            ContextKind::Class => "Class",
            ContextKind::Solution => "Solution",
            ContextKind::Project => "Project",
        }
    }
}

/// One attached context item.
///
/// References are owned by the active session; the set is append/remove
/// only, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReference {
    /// Unique reference identifier.
    pub id: Uuid,
    /// What kind of item this reference points at.
    pub kind: ContextKind,
    /// Display label (file name, symbol name, ...).
    pub label: String,
    /// Source file path, when the item has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// The materialized text content fed into the prompt.
    pub content: String,
    /// Estimated token count of `content` (approximate, display only).
    pub token_estimate: u32,
    /// Timestamp when the reference was created (ISO 8601 format).
    pub created_at: String,
}

impl ContextReference {
    pub fn new(kind: ContextKind, label: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            file_path: None,
            class_name: None,
            method_name: None,
            project_name: None,
            token_estimate: estimate_tokens(&content),
            content,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    pub fn with_method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Short display text with the token estimate.
    pub fn short_display(&self) -> String {
        format!("{} (~{} tokens)", self.label, self.token_estimate)
    }
}
