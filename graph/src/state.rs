//! Persisted graph layout.
//!
//! The graph is stored as two independent collections:
//!
//! ```text
//! concepts:    { "<name>": { "mentionCount": 3, "lastUpdated": "<RFC 3339>", "description": "" } }
//! connections: [ { "from": "<name>", "to": "<name>", "strength": 0.6, "source": "<document>" } ]
//! ```
//!
//! Importing validates every graph invariant and refuses corrupt state
//! outright; nothing is repaired.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::concept::{Concept, Connection, PairKey};
use crate::error::{GraphError, Result};
use crate::store::GraphStore;

/// Persisted form of a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRecord {
    pub mention_count: u32,
    pub last_updated: DateTime<Utc>,
    /// Empty when the concept has no description.
    #[serde(default)]
    pub description: String,
}

/// Persisted form of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub from: String,
    pub to: String,
    pub strength: f64,
    pub source: String,
}

/// Serializable snapshot of a whole graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// Concepts keyed by name, in insertion order. A name may appear only
    /// once.
    #[serde(deserialize_with = "unique_concepts::deserialize")]
    pub concepts: IndexMap<String, ConceptRecord>,

    /// Connections in insertion order.
    pub connections: Vec<ConnectionRecord>,
}

impl GraphState {
    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a standalone concepts object, rejecting repeated names.
    pub fn concepts_from_json(json: &str) -> serde_json::Result<IndexMap<String, ConceptRecord>> {
        let mut de = serde_json::Deserializer::from_str(json);
        let concepts = unique_concepts::deserialize(&mut de)?;
        de.end()?;
        Ok(concepts)
    }
}

/// Concepts map deserialization that fails on a repeated key instead of
/// letting the last entry win.
mod unique_concepts {
    use std::fmt;

    use indexmap::IndexMap;
    use indexmap::map::Entry;
    use serde::Deserializer;
    use serde::de::{Error, MapAccess, Visitor};

    use super::ConceptRecord;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<IndexMap<String, ConceptRecord>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ConceptsVisitor)
    }

    struct ConceptsVisitor;

    impl<'de> Visitor<'de> for ConceptsVisitor {
        type Value = IndexMap<String, ConceptRecord>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of concept names to concept records")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut concepts = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, record)) = map.next_entry::<String, ConceptRecord>()? {
                match concepts.entry(name) {
                    Entry::Occupied(entry) => {
                        return Err(A::Error::custom(format!(
                            "duplicate concept {:?}",
                            entry.key()
                        )));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(record);
                    }
                }
            }
            Ok(concepts)
        }
    }
}

impl From<&Concept> for ConceptRecord {
    fn from(concept: &Concept) -> Self {
        Self {
            mention_count: concept.mention_count,
            last_updated: concept.last_updated,
            description: concept.description.clone().unwrap_or_default(),
        }
    }
}

impl From<&Connection> for ConnectionRecord {
    fn from(connection: &Connection) -> Self {
        Self {
            from: connection.a.clone(),
            to: connection.b.clone(),
            strength: connection.strength,
            source: connection.source_document.clone(),
        }
    }
}

impl GraphStore {
    /// Snapshot the graph in its persisted layout.
    pub fn export_state(&self) -> GraphState {
        GraphState {
            concepts: self
                .concepts()
                .map(|concept| (concept.name.clone(), ConceptRecord::from(concept)))
                .collect(),
            connections: self.connections().map(ConnectionRecord::from).collect(),
        }
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Fails with [`GraphError::CorruptState`] if any invariant is violated.
    pub fn import_state(state: GraphState) -> Result<Self> {
        let mut concepts = IndexMap::with_capacity(state.concepts.len());
        for (name, record) in state.concepts {
            if name.is_empty() {
                return Err(GraphError::corrupt("concept with an empty name"));
            }
            if record.mention_count == 0 {
                return Err(GraphError::corrupt(format!(
                    "concept {name:?} has a mention count of 0"
                )));
            }
            let concept = Concept {
                name: name.clone(),
                mention_count: record.mention_count,
                last_updated: record.last_updated,
                description: Some(record.description).filter(|d| !d.is_empty()),
            };
            concepts.insert(name, concept);
        }

        let mut connections = IndexMap::with_capacity(state.connections.len());
        let mut seen = HashSet::new();
        for record in state.connections {
            for endpoint in [&record.from, &record.to] {
                if !concepts.contains_key(endpoint.as_str()) {
                    return Err(GraphError::corrupt(format!(
                        "connection {} ↔ {} references unknown concept {endpoint:?}",
                        record.from, record.to
                    )));
                }
            }
            if !(0.0..=1.0).contains(&record.strength) {
                return Err(GraphError::corrupt(format!(
                    "connection {} ↔ {} has strength {} outside [0, 1]",
                    record.from, record.to, record.strength
                )));
            }
            let key = PairKey::new(&record.from, &record.to);
            if !seen.insert(key.clone()) {
                return Err(GraphError::corrupt(format!(
                    "duplicate connection {} ↔ {}",
                    record.from, record.to
                )));
            }
            let Some(connection) =
                Connection::new(record.from, record.to, record.strength, record.source)
            else {
                return Err(GraphError::corrupt("connection is a self-loop"));
            };
            connections.insert(key, connection);
        }

        debug!(
            "Imported graph state: {} concepts, {} connections",
            concepts.len(),
            connections.len()
        );
        Ok(Self::from_parts(concepts, connections))
    }
}
