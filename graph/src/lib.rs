//! # Concept Graph
//!
//! This crate implements the knowledge-graph engine behind notegraph. It
//! provides:
//!
//! - **Concept Extraction**: literal `[[concept]]` references from document text
//! - **Graph Store**: the concept registry and weighted, undirected connections
//! - **Co-occurrence Updates**: concepts referenced together grow connected
//! - **Analytics**: connection counts, strength bands, density, ranking, clusters
//! - **Search**: ranked case-insensitive lookup over concepts and connections
//! - **Persisted State**: export/import with invariant validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Concept Graph                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  document ──► ConceptExtractor ──► UpdateEngine ──► GraphStore │
//! │                                                        │        │
//! │                            ┌───────────────────────────┤        │
//! │                            ▼                           ▼        │
//! │                     AnalyticsEngine              SearchEngine   │
//! │                                                                 │
//! │  GraphStore ◄──► GraphState (persisted layout)                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and free of I/O. Sharing a store between
//! threads is the caller's concern (see the `notegraph-vault` crate).

pub mod analytics;
pub mod concept;
pub mod error;
pub mod extraction;
pub mod search;
pub mod state;
pub mod store;
pub mod update;

pub use analytics::{AnalyticsEngine, Cluster, ConceptRank, GraphStats, StrengthGroups};
pub use concept::{Concept, Connection, PairKey, StrengthBand};
pub use error::{GraphError, Result};
pub use extraction::{ConceptExtractor, Mention};
pub use search::{ResultKind, SearchEngine, SearchResult};
pub use state::{ConceptRecord, ConnectionRecord, GraphState};
pub use store::{ConnectionUpsert, GraphStore};
pub use update::{MentionPolicy, UpdateEngine, UpdatePolicy, UpdateSummary};
