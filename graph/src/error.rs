//! Error types for the concept graph.

use thiserror::Error;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur in the concept graph.
///
/// Most malformed input is filtered rather than reported: empty references,
/// self-loops and duplicate pairs are no-ops. Only state that cannot be
/// trusted surfaces as an error.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Persisted state violates a graph invariant.
    #[error("corrupt graph state: {0}")]
    CorruptState(String),

    /// Update policy parameters would break the strength bounds.
    #[error("invalid update policy: {0}")]
    InvalidPolicy(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptState(reason.into())
    }
}
