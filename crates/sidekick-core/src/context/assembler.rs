//! Context assembly for prompt construction.
//!
//! The assembler owns the ordered set of attached context references plus
//! an independent snapshot of the live document/selection, and concatenates
//! them into one bounded textual context block.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::reference::ContextReference;
use super::{estimate_tokens, truncate_payload};

/// Snapshot of the active document and selection, refreshed per turn from
/// the editor collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSnapshot {
    /// Full text of the active document, when one is open.
    pub document: Option<String>,
    /// The current selection, when non-empty.
    pub selection: Option<String>,
    /// Language of the active document.
    pub language: Option<String>,
    /// Path of the active document.
    pub file_path: Option<PathBuf>,
}

impl DocumentSnapshot {
    /// The text a proposed edit would replace: the selection when present,
    /// otherwise the whole document.
    pub fn edit_target_text(&self) -> Option<&str> {
        self.selection
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.document.as_deref())
    }
}

/// Gathers context items into one bounded textual context block.
pub struct ContextAssembler {
    references: Vec<ContextReference>,
    snapshot: DocumentSnapshot,
}

impl ContextAssembler {
    pub fn new() -> Self {
        Self {
            references: Vec::new(),
            snapshot: DocumentSnapshot::default(),
        }
    }

    /// Adds a reference. Adding a second reference to the same file path is
    /// a no-op; returns whether the reference was added.
    pub fn add_reference(&mut self, reference: ContextReference) -> bool {
        if let Some(path) = &reference.file_path {
            if self.has_file(path) {
                return false;
            }
        }
        self.references.push(reference);
        true
    }

    /// Removes a reference by id. Removing a missing id is a no-op;
    /// returns whether anything was removed.
    pub fn remove_reference(&mut self, id: Uuid) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r.id != id);
        self.references.len() != before
    }

    pub fn clear_references(&mut self) {
        self.references.clear();
    }

    pub fn references(&self) -> &[ContextReference] {
        &self.references
    }

    /// Whether a file path is already attached.
    pub fn has_file(&self, path: &Path) -> bool {
        self.references
            .iter()
            .any(|r| r.file_path.as_deref() == Some(path))
    }

    /// Replaces the live document/selection snapshot.
    pub fn set_snapshot(&mut self, snapshot: DocumentSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    /// Concatenates all reference contents ahead of the live snapshot.
    ///
    /// Each payload is individually truncated at the context ceiling.
    /// Returns the empty string when nothing is available.
    pub fn build_context(&self) -> String {
        let mut out = String::new();

        for reference in &self.references {
            out.push_str(&format!(
                "### {}: {}\n{}\n\n",
                reference.kind.label(),
                reference.label,
                truncate_payload(&reference.content)
            ));
        }

        if let Some(selection) = self.snapshot.selection.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!(
                "### Current selection\n{}\n\n",
                truncate_payload(selection)
            ));
        } else if let Some(document) = self.snapshot.document.as_deref().filter(|d| !d.is_empty()) {
            let label = match &self.snapshot.language {
                Some(lang) => format!("### Active document ({lang})\n"),
                None => "### Active document\n".to_string(),
            };
            out.push_str(&label);
            out.push_str(&truncate_payload(document));
            out.push_str("\n\n");
        }

        out.trim_end().to_string()
    }

    /// Total token estimate across all attached references.
    pub fn total_token_estimate(&self) -> u32 {
        self.references.iter().map(|r| r.token_estimate).sum()
    }

    /// Human-readable summary of the attached references.
    pub fn summary(&self) -> String {
        if self.references.is_empty() {
            return "No context attached".to_string();
        }

        let mut out = format!(
            "References: {}\nTotal tokens: ~{}\n",
            self.references.len(),
            self.total_token_estimate()
        );
        for reference in &self.references {
            out.push_str(&format!("  {}\n", reference.short_display()));
        }
        out
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new()
    }
}
