//! File-backed graph state.
//!
//! The graph lives in two JSON files inside the state directory:
//! `concepts.json` (name → record) and `connections.json` (array of
//! records). Each file is replaced atomically on save.

use std::path::{Path, PathBuf};

use notegraph_graph::{GraphError, GraphState};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, StorageError};

/// File name of the concept collection.
pub const CONCEPTS_FILE: &str = "concepts.json";

/// File name of the connection collection.
pub const CONNECTIONS_FILE: &str = "connections.json";

/// Reads and writes graph state in a directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Open a state store, creating the directory if it doesn't exist.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// The state directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `concepts.json`.
    pub fn concepts_path(&self) -> PathBuf {
        self.root.join(CONCEPTS_FILE)
    }

    /// Path of `connections.json`.
    pub fn connections_path(&self) -> PathBuf {
        self.root.join(CONNECTIONS_FILE)
    }

    /// Load the stored state.
    ///
    /// Returns `None` when nothing has been saved yet. A file that cannot be
    /// parsed is reported as corrupt state; it is never skipped.
    pub async fn load(&self) -> Result<Option<GraphState>> {
        let concepts_path = self.concepts_path();
        let connections_path = self.connections_path();

        match (concepts_path.exists(), connections_path.exists()) {
            (false, false) => {
                debug!("No stored state in {}", self.root.display());
                return Ok(None);
            }
            (true, true) => {}
            _ => {
                return Err(StorageError::Incomplete(self.root.display().to_string()).into());
            }
        }

        let concepts = GraphState::concepts_from_json(&read(&concepts_path).await?)
            .map_err(|e| corrupt_file(&concepts_path, e))?;
        let connections = serde_json::from_str(&read(&connections_path).await?)
            .map_err(|e| corrupt_file(&connections_path, e))?;

        let state = GraphState {
            concepts,
            connections,
        };
        info!(
            "Loaded {} concepts and {} connections from {}",
            state.concepts.len(),
            state.connections.len(),
            self.root.display()
        );
        Ok(Some(state))
    }

    /// Save the state, replacing both files.
    pub async fn save(&self, state: &GraphState) -> Result<()> {
        write_atomic(&self.concepts_path(), &state.concepts).await?;
        write_atomic(&self.connections_path(), &state.connections).await?;
        debug!(
            "Saved {} concepts and {} connections",
            state.concepts.len(),
            state.connections.len()
        );
        Ok(())
    }
}

async fn read(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::ReadFile(format!("{}: {e}", path.display())))?;
    Ok(content)
}

/// Write JSON to a temp file next to `path`, then rename it into place.
async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(GraphError::from)?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)
        .await
        .map_err(|e| StorageError::WriteFile(format!("{}: {e}", temp_path.display())))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::WriteFile(format!("{}: {e}", path.display())))?;
    Ok(())
}

fn corrupt_file(path: &Path, error: serde_json::Error) -> GraphError {
    GraphError::CorruptState(format!("{}: {error}", path.display()))
}
