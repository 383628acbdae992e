//! Scratch-file materialization for external diff viewers.
//!
//! Host diff viewers compare files on disk, so a pending edit is
//! materialized as a pair of temp files carrying the target file's
//! extension (viewers pick syntax highlighting from it). Scratch paths are
//! session-local: they are recorded on the in-memory edit only and are
//! never persisted.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::fs;

use sidekick_core::edit::{CodeEdit, ScratchPair};

/// Writes edit texts into a session-scoped temp directory.
///
/// Dropping the materializer removes the directory and everything in it.
pub struct ScratchMaterializer {
    root: TempDir,
}

impl ScratchMaterializer {
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("sidekick-diff-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Writes the original and proposed texts of an edit to scratch files
    /// and returns the pair. The files carry the target's extension.
    pub async fn materialize(&self, edit: &CodeEdit) -> Result<ScratchPair> {
        let extension = edit
            .file_path
            .as_deref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .unwrap_or("txt");

        let original_path = self
            .root
            .path()
            .join(format!("{}_original.{extension}", edit.id));
        let modified_path = self
            .root
            .path()
            .join(format!("{}_proposed.{extension}", edit.id));

        fs::write(&original_path, &edit.original_code)
            .await
            .context("Failed to write original scratch file")?;
        fs::write(&modified_path, &edit.modified_code)
            .await
            .context("Failed to write proposed scratch file")?;

        Ok(ScratchPair {
            original_path,
            modified_path,
        })
    }

    /// Removes the scratch files of a resolved edit, best-effort.
    pub async fn cleanup(&self, pair: &ScratchPair) {
        for path in [&pair.original_path, &pair.modified_path] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("failed to remove scratch file {}: {e}", path.display());
                }
            }
        }
    }
}
