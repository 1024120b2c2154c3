//! Ranked lookup over concept names and connection endpoints.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::GraphStore;

/// Relevance of a concept whose name equals the query.
pub const EXACT_MATCH_RELEVANCE: f64 = 1.0;

/// Relevance of a concept whose name contains the query.
pub const PARTIAL_MATCH_RELEVANCE: f64 = 0.8;

/// Relevance of a connection with a matching endpoint.
pub const CONNECTION_RELEVANCE: f64 = 0.6;

/// What a search result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Concept,
    Connection,
}

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Concept or connection.
    pub kind: ResultKind,

    /// Display form: the concept name, or `"a ↔ b"` for a connection.
    pub title: String,

    /// Relevance score (0.0 to 1.0).
    pub relevance: f64,

    /// The concept names the result refers to.
    pub concepts: Vec<String>,
}

/// Case-insensitive substring search over a `GraphStore`.
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine<'a> {
    store: &'a GraphStore,
}

impl<'a> SearchEngine<'a> {
    /// Create a search view over a store.
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Search concepts and connections.
    ///
    /// Results are ordered by relevance; equal relevance keeps enumeration
    /// order (concepts first, then connections, each in collection order).
    /// A blank query returns nothing. Otherwise the query is matched as
    /// given, surrounding whitespace included.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let mut results: Vec<SearchResult> = Vec::new();

        for concept in self.store.concepts() {
            let name = concept.name.to_lowercase();
            if name.contains(&needle) {
                let relevance = if name == needle {
                    EXACT_MATCH_RELEVANCE
                } else {
                    PARTIAL_MATCH_RELEVANCE
                };
                results.push(SearchResult {
                    kind: ResultKind::Concept,
                    title: concept.name.clone(),
                    relevance,
                    concepts: vec![concept.name.clone()],
                });
            }
        }

        for connection in self.store.connections() {
            if connection.a.to_lowercase().contains(&needle)
                || connection.b.to_lowercase().contains(&needle)
            {
                results.push(SearchResult {
                    kind: ResultKind::Connection,
                    title: connection.display(),
                    relevance: CONNECTION_RELEVANCE,
                    concepts: vec![connection.a.clone(), connection.b.clone()],
                });
            }
        }

        results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        debug!("Search {query:?} matched {} results", results.len());
        results
    }
}
