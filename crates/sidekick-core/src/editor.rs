//! Editor access boundary.
//!
//! The host IDE owns documents, selections, and text replacement. The core
//! consumes that capability through this trait so the session logic stays
//! testable with a fake and free of ambient service lookups.

use std::path::PathBuf;

use async_trait::async_trait;

/// Best-effort access to the host editor.
///
/// All methods are fallible in the "return nothing" sense: a missing
/// document, an empty selection, or a host-side failure yields `None` /
/// `false` rather than an error.
#[async_trait]
pub trait EditorAccess: Send + Sync {
    /// Full text of the active document.
    async fn active_document_text(&self) -> Option<String>;

    /// The current selection, when non-empty.
    async fn selected_text(&self) -> Option<String>;

    /// Path of the active document.
    async fn active_document_path(&self) -> Option<PathBuf>;

    /// Language of the active document, as the host reports it.
    async fn active_document_language(&self) -> Option<String>;

    /// Replaces the current selection; returns whether it succeeded.
    async fn replace_selected_text(&self, text: &str) -> bool;

    /// Replaces the whole document text; returns whether it succeeded.
    async fn replace_document_text(&self, text: &str) -> bool;
}
