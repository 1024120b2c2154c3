//! Error types for the knowledge-graph service.

use thiserror::Error;

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors that can occur in the knowledge-graph service.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Graph error (including corrupt persisted state).
    #[error("graph error: {0}")]
    Graph(#[from] notegraph_graph::GraphError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Note watcher error.
    #[error("watcher error: {0}")]
    Watcher(#[from] notegraph_watcher::WatcherError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a state file.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write a state file.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// Only one of the two state files exists.
    #[error("incomplete state in {0}: concepts.json and connections.json must both exist")]
    Incomplete(String),
}
