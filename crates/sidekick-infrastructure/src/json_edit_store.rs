//! JSON-file EditStore implementation.
//!
//! The full pending-edit set lives in one JSON file that is overwritten on
//! every mutation (last-writer-wins). Whole-file overwrite sidesteps
//! concurrent-write corruption at the cost of O(n) work per mutation,
//! which is fine for a human-reviewed set of tens of edits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use sidekick_core::edit::CodeEdit;
use sidekick_core::repository::EditStore;

use crate::paths::SidekickPaths;

const PENDING_EDITS_FILE: &str = "pending_edits.json";

/// Pending-edit store backed by a single JSON file.
pub struct JsonEditStore {
    file_path: PathBuf,
}

impl JsonEditStore {
    /// Creates a store writing to `pending_edits.json` under `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            file_path: base_dir.as_ref().join(PENDING_EDITS_FILE),
        }
    }

    /// Creates a store at the default per-user data location.
    pub fn default_location() -> Result<Self> {
        let data_dir = SidekickPaths::data_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get data directory: {}", e))?;
        Ok(Self::new(data_dir))
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn write_snapshot(&self, edits: &[CodeEdit]) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create pending edits directory")?;
        }

        let json =
            serde_json::to_string_pretty(edits).context("Failed to serialize pending edits")?;
        fs::write(&self.file_path, json)
            .await
            .context("Failed to write pending edits file")?;
        Ok(())
    }
}

#[async_trait]
impl EditStore for JsonEditStore {
    async fn save_all(&self, edits: &[CodeEdit]) -> Result<()> {
        self.write_snapshot(edits).await
    }

    async fn load_all(&self) -> Vec<CodeEdit> {
        let json = match fs::read_to_string(&self.file_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read pending edits: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(edits) => edits,
            Err(e) => {
                tracing::warn!("skipping corrupt pending edits file: {e}");
                Vec::new()
            }
        }
    }

    async fn upsert(&self, edit: &CodeEdit) -> Result<()> {
        let mut edits = self.load_all().await;
        edits.retain(|e| e.id != edit.id);
        edits.push(edit.clone());
        self.write_snapshot(&edits).await
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut edits = self.load_all().await;
        let before = edits.len();
        edits.retain(|e| e.id != id);
        if edits.len() != before {
            self.write_snapshot(&edits).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete pending edits file"),
        }
    }
}
