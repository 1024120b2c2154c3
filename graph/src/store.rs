//! The concept registry and connection collection.
//!
//! `GraphStore` owns every concept and connection and is the only place
//! that mutates them. After every operation:
//!
//! 1. every connection's endpoints exist as concepts
//! 2. at most one connection exists per unordered pair
//! 3. every strength lies in `[0.0, 1.0]`
//! 4. no connection is a self-loop
//! 5. every concept has `mention_count >= 1`
//!
//! Both collections keep insertion order; analytics and search rely on it
//! for deterministic tie-breaking.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::concept::{Concept, Connection, PairKey};
use crate::update::valid_increment;

/// Outcome of a connection upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionUpsert {
    /// A new connection was created.
    Created,

    /// An existing connection was reinforced.
    Strengthened,

    /// The request would violate an invariant and was ignored.
    Rejected,
}

/// Weighted concept co-occurrence graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStore {
    /// All known concepts, keyed by name.
    concepts: IndexMap<String, Concept>,

    /// Connections keyed by their unordered endpoint pair.
    connections: IndexMap<PairKey, Connection>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mention of `name` now.
    pub fn upsert_concept(&mut self, name: &str) -> Option<&Concept> {
        self.upsert_concept_at(name, Utc::now())
    }

    /// Record a mention of `name` at the given time.
    ///
    /// Creates the concept with a mention count of 1, or increments the
    /// count of an existing one. Empty names are rejected.
    pub fn upsert_concept_at(&mut self, name: &str, at: DateTime<Utc>) -> Option<&Concept> {
        if name.is_empty() {
            return None;
        }

        let concept = self
            .concepts
            .entry(name.to_string())
            .and_modify(|concept| concept.mention(at))
            .or_insert_with(|| {
                debug!("Created concept: {name}");
                Concept::new(name, at)
            });
        Some(&*concept)
    }

    /// Create or reinforce the connection between `a` and `b`.
    ///
    /// A new connection starts at `initial_strength`; an existing one gains
    /// `increment`, capped at 1.0, and takes `document_id` as its source.
    /// Self-loops, unknown endpoints and strength parameters that would
    /// leave `[0, 1]` are rejected.
    pub(crate) fn upsert_connection_with(
        &mut self,
        a: &str,
        b: &str,
        document_id: &str,
        initial_strength: f64,
        increment: f64,
    ) -> ConnectionUpsert {
        if !(0.0..=1.0).contains(&initial_strength) || !valid_increment(increment) {
            debug!("Rejected connection {a} ↔ {b}: strength {initial_strength} / {increment}");
            return ConnectionUpsert::Rejected;
        }

        let key = PairKey::new(a, b);
        if key.is_loop() || !self.contains(a) || !self.contains(b) {
            return ConnectionUpsert::Rejected;
        }

        if let Some(connection) = self.connections.get_mut(&key) {
            connection.strength = reinforce(connection.strength, increment);
            connection.source_document = document_id.to_string();
            return ConnectionUpsert::Strengthened;
        }

        match Connection::new(a, b, initial_strength, document_id) {
            Some(connection) => {
                debug!("Created connection: {a} ↔ {b}");
                self.connections.insert(key, connection);
                ConnectionUpsert::Created
            }
            None => ConnectionUpsert::Rejected,
        }
    }

    /// Create or reinforce a connection with the default update policy.
    pub fn upsert_connection(&mut self, a: &str, b: &str, document_id: &str) -> ConnectionUpsert {
        self.upsert_connection_with(
            a,
            b,
            document_id,
            crate::update::INITIAL_STRENGTH,
            crate::update::STRENGTH_INCREMENT,
        )
    }

    /// Get a concept by name.
    pub fn get_concept(&self, name: &str) -> Option<&Concept> {
        self.concepts.get(name)
    }

    /// Check if a concept exists.
    pub fn contains(&self, name: &str) -> bool {
        self.concepts.contains_key(name)
    }

    /// Get the connection between two concepts, in either order.
    pub fn connection(&self, a: &str, b: &str) -> Option<&Connection> {
        self.connections.get(&PairKey::new(a, b))
    }

    /// All connections where `name` is an endpoint, in collection order.
    pub fn connections_of(&self, name: &str) -> Vec<&Connection> {
        self.connections
            .values()
            .filter(|connection| connection.involves(name))
            .collect()
    }

    /// Set or clear a concept's description. Returns whether the concept exists.
    pub fn set_description(&mut self, name: &str, description: Option<String>) -> bool {
        match self.concepts.get_mut(name) {
            Some(concept) => {
                concept.description = description.filter(|d| !d.is_empty());
                true
            }
            None => false,
        }
    }

    /// Remove a concept and every connection touching it.
    pub fn delete_concept(&mut self, name: &str) -> Option<Concept> {
        let concept = self.concepts.shift_remove(name)?;

        let before = self.connections.len();
        self.connections.retain(|key, _| !key.contains(name));

        debug!(
            "Deleted concept {name} and {} incident connections",
            before - self.connections.len()
        );
        Some(concept)
    }

    /// Concepts in insertion order.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Number of concepts.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether the graph has no concepts.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Build a store from already validated parts.
    pub(crate) fn from_parts(
        concepts: IndexMap<String, Concept>,
        connections: IndexMap<PairKey, Connection>,
    ) -> Self {
        Self {
            concepts,
            connections,
        }
    }
}

/// Add `increment` to `strength`, capped at 1.0.
///
/// The sum is snapped to six decimal places so repeated tenths land on the
/// band thresholds exactly instead of drifting just below them.
fn reinforce(strength: f64, increment: f64) -> f64 {
    let next = (strength + increment).clamp(0.0, 1.0);
    (next * 1_000_000.0).round() / 1_000_000.0
}
