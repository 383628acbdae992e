//! Unified path management for Sidekick state on disk.
//!
//! # Directory Structure
//!
//! ```text
//! <config dir>/sidekick/           # e.g. ~/.config/sidekick
//! └── settings.toml                # server address, selected model
//!
//! <data dir>/sidekick/             # e.g. ~/.local/share/sidekick
//! ├── pending_edits.json           # pending-edit snapshot
//! └── history/                     # one JSON file per conversation
//!     └── <conversation-id>.json
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Sidekick.
pub struct SidekickPaths;

impl SidekickPaths {
    /// Returns the Sidekick configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|d| d.join("sidekick"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the Sidekick per-user data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_local_dir()
            .map(|d| d.join("sidekick"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the settings file.
    pub fn settings_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("settings.toml"))
    }

    /// Returns the path to the pending-edit snapshot file.
    pub fn pending_edits_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("pending_edits.json"))
    }

    /// Returns the path to the conversation history directory.
    pub fn history_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("history"))
    }
}
