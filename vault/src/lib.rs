//! # Knowledge Graph Vault
//!
//! The shared service around the concept graph:
//!
//! - **KnowledgeGraph**: one lock-guarded graph for every caller
//! - **Persistence**: `concepts.json` and `connections.json`, saved after each mutation
//! - **Notes Folders**: batch ingestion and live watching
//! - **Configuration**: TOML-loadable settings with sensible defaults
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        KnowledgeGraph                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  NoteScanner / NoteWatcher ──► on_document_changed           │
//! │                                     │ (write lock)           │
//! │                                     ▼                        │
//! │                        RwLock<GraphStore> ──► StateStore     │
//! │                                     │ (read lock)            │
//! │                                     ▼                        │
//! │                          analytics & search queries          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notegraph_vault::KnowledgeGraph;
//!
//! let graph = KnowledgeGraph::builder()
//!     .with_state_dir("~/.local/share/notegraph")
//!     .build()
//!     .await?;
//!
//! graph.on_document_changed("daily/2024-03-01.md", "[[Rust]] meets [[Tokio]]").await?;
//! let results = graph.search("rust").await;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod storage;

pub use config::VaultConfig;
pub use engine::{IngestReport, KnowledgeGraph, KnowledgeGraphBuilder, WatchHandle};
pub use error::{Result, StorageError, VaultError};
pub use storage::StateStore;

// Re-export from dependencies for convenience
pub use notegraph_graph::{
    Cluster, Concept, ConceptRank, Connection, GraphState, GraphStats, MentionPolicy,
    ResultKind, SearchResult, StrengthBand, StrengthGroups, UpdatePolicy, UpdateSummary,
};
pub use notegraph_watcher::{DocumentEvent, DocumentEventKind, WatchConfig};
