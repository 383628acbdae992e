//! Building reviewable edit proposals out of model responses.
//!
//! The first fenced code block of a response becomes the proposed text and
//! the prose before it becomes the description. Extraction never fails:
//! a response without code simply yields no edit.

use std::path::PathBuf;

use crate::chat::MessageParser;

use super::model::CodeEdit;

/// Fallback description when a response opens directly with a code fence.
const DEFAULT_DESCRIPTION: &str = "Code modification";

/// Builds and validates [`CodeEdit`] proposals from response text.
pub struct EditBuilder;

impl EditBuilder {
    /// Creates an edit proposal from a model response.
    ///
    /// The first code block wins; subsequent blocks are ignored for edit
    /// building (they still render as blocks in the transcript). Returns
    /// `None` when the response contains no fenced code.
    pub fn build_edit(
        response_text: &str,
        original_code: &str,
        file_path: Option<PathBuf>,
    ) -> Option<CodeEdit> {
        let blocks = MessageParser::extract_code_blocks(response_text);
        let first = blocks.first()?;

        let description = match response_text.find("```") {
            Some(index) if index > 0 => {
                let prefix = response_text[..index].trim();
                if prefix.is_empty() {
                    DEFAULT_DESCRIPTION.to_string()
                } else {
                    prefix.to_string()
                }
            }
            _ => DEFAULT_DESCRIPTION.to_string(),
        };

        Some(CodeEdit::new(
            file_path,
            original_code,
            first.code.trim(),
            description,
        ))
    }

    /// Checks that an edit is actionable: non-empty proposed text that
    /// actually differs from the original after trimming.
    pub fn validate(edit: &CodeEdit) -> bool {
        if edit.modified_code.trim().is_empty() {
            return false;
        }

        edit.original_code.trim() != edit.modified_code.trim()
    }

    /// Renders a human-readable preview of an edit.
    ///
    /// The comparison is a naive index-aligned line diff, not a minimal
    /// edit-distance diff; lines are paired by position and unequal pairs
    /// render as `-`/`+` with empty sides omitted.
    pub fn render_preview(edit: &CodeEdit) -> String {
        let file_label = edit
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "active document".to_string());

        let mut out = String::new();
        out.push_str("=== Code Modification Preview ===\n");
        out.push_str(&format!("Description: {}\n", edit.description));
        out.push_str(&format!("File: {}\n\n", file_label));
        out.push_str("--- Original\n");
        out.push_str("+++ Modified\n\n");

        let original_text = normalize_newlines(&edit.original_code);
        let modified_text = normalize_newlines(&edit.modified_code);
        let original_lines: Vec<&str> = original_text.split('\n').collect();
        let modified_lines: Vec<&str> = modified_text.split('\n').collect();
        let max_lines = original_lines.len().max(modified_lines.len());

        for i in 0..max_lines {
            let original = original_lines.get(i).copied().unwrap_or("");
            let modified = modified_lines.get(i).copied().unwrap_or("");

            if original != modified {
                if !original.is_empty() {
                    out.push_str(&format!("- {original}\n"));
                }
                if !modified.is_empty() {
                    out.push_str(&format!("+ {modified}\n"));
                }
            } else {
                out.push_str(&format!("  {original}\n"));
            }
        }

        out
    }
}

/// Folds `\r\n` and bare `\r` line endings into `\n` so line splitting
/// treats all three the same way.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
