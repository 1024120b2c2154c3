//! Configuration for the knowledge-graph service.

use std::path::{Path, PathBuf};

use notegraph_graph::UpdatePolicy;
use notegraph_watcher::WatchConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VaultError};

/// Configuration for a [`KnowledgeGraph`](crate::KnowledgeGraph).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// state_dir = "/home/me/.local/share/notegraph"
///
/// [update]
/// mentions = "once_per_document"
///
/// [notes]
/// path = "/home/me/notes"
/// exclude_patterns = ["**/archive/**"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding `concepts.json` and `connections.json`.
    pub state_dir: PathBuf,

    /// Whether state is written after every mutation.
    pub persist: bool,

    /// Co-occurrence update policy.
    pub update: UpdatePolicy,

    /// Notes folder to ingest and watch.
    pub notes: Option<WatchConfig>,
}

impl VaultConfig {
    /// Create a configuration storing state in the given directory.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            persist: true,
            update: UpdatePolicy::default(),
            notes: None,
        }
    }

    /// A configuration that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            persist: false,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the update policy and the notes configuration.
    pub fn validate(&self) -> Result<()> {
        self.update
            .validate()
            .map_err(|e| VaultError::Config(e.to_string()))?;
        if let Some(notes) = &self.notes {
            notes.validate()?;
        }
        Ok(())
    }

    /// Set the state directory.
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Set the notes folder.
    pub fn with_notes(mut self, notes: WatchConfig) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Default location of the state directory.
    pub fn default_state_dir() -> PathBuf {
        dirs::data_dir().unwrap_or_default().join("notegraph")
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self::new(Self::default_state_dir())
    }
}
