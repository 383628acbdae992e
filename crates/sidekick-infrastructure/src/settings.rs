//! Settings persistence.
//!
//! Server address and selected model are stored in a small TOML file under
//! the per-user config directory. Reads are cached and fall back to
//! defaults on any failure; settings are a convenience, never fatal.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths::SidekickPaths;

pub const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:11434";

/// User-facing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Address of the inference server.
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// The last selected model, when one was chosen.
    #[serde(default)]
    pub model: Option<String>,
}

fn default_server_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            model: None,
        }
    }
}

/// Settings store that loads and caches the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    /// Cached settings loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    cache: Arc<RwLock<Option<Settings>>>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a store at the default settings location.
    pub fn default_location() -> Result<Self> {
        let path = SidekickPaths::settings_file()
            .map_err(|e| anyhow::anyhow!("Failed to get settings path: {}", e))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the settings, loading from file if not cached. Any read or
    /// parse failure yields the defaults.
    pub fn get(&self) -> Settings {
        {
            let read_lock = self.cache.read().unwrap();
            if let Some(cached) = read_lock.as_ref() {
                return cached.clone();
            }
        }

        let loaded = self.load_from_disk().unwrap_or_default();

        {
            let mut write_lock = self.cache.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Persists the settings and refreshes the cache.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let toml = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(&self.path, toml).context("Failed to write settings file")?;

        let mut write_lock = self.cache.write().unwrap();
        *write_lock = Some(settings.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.cache.write().unwrap();
        *write_lock = None;
    }

    fn load_from_disk(&self) -> Option<Settings> {
        let toml = std::fs::read_to_string(&self.path).ok()?;
        match toml::from_str(&toml) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("falling back to default settings: {e}");
                None
            }
        }
    }
}
