//! Applying a document's concept references to the graph.
//!
//! Every mention upserts its concept. Every pair of mentions `(i, j)` with
//! `i < j` and distinct names then creates or reinforces the connection
//! between them. Because the sequence is not de-duplicated, a pair that
//! appears several times in one document is reinforced several times.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::store::{ConnectionUpsert, GraphStore};

/// Strength of a connection on its first co-occurrence.
pub const INITIAL_STRENGTH: f64 = 0.5;

/// Strength added on every subsequent co-occurrence.
pub const STRENGTH_INCREMENT: f64 = 0.1;

/// Which mentions take part in the pairwise connection update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionPolicy {
    /// Every mention, duplicates included.
    #[default]
    EveryMention,

    /// Each distinct concept once per document, in first-mention order.
    /// Mention counts still count every mention.
    OncePerDocument,
}

/// Parameters of the co-occurrence update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePolicy {
    /// Strength of a newly created connection.
    pub initial_strength: f64,

    /// Strength added when a connection is reinforced.
    pub increment: f64,

    /// Which mentions form pairs.
    pub mentions: MentionPolicy,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            initial_strength: INITIAL_STRENGTH,
            increment: STRENGTH_INCREMENT,
            mentions: MentionPolicy::EveryMention,
        }
    }
}

impl UpdatePolicy {
    /// Check that applying this policy keeps every strength in `[0, 1]`.
    ///
    /// `initial_strength` must lie in `[0, 1]` and `increment` must be a
    /// finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_strength) {
            return Err(GraphError::InvalidPolicy(format!(
                "initial_strength must be within [0, 1], got {}",
                self.initial_strength
            )));
        }
        if !valid_increment(self.increment) {
            return Err(GraphError::InvalidPolicy(format!(
                "increment must be a non-negative number, got {}",
                self.increment
            )));
        }
        Ok(())
    }

    /// Set the mention policy.
    pub fn with_mentions(mut self, mentions: MentionPolicy) -> Self {
        self.mentions = mentions;
        self
    }
}

/// What a single document update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// The document that was applied.
    pub document_id: String,

    /// Number of concept references processed.
    pub mentions: usize,

    /// Concepts seen for the first time.
    pub concepts_created: usize,

    /// Connections created.
    pub connections_created: usize,

    /// Reinforcements applied to existing connections.
    pub connections_strengthened: usize,
}

impl UpdateSummary {
    /// Whether the update touched any connection.
    pub fn changed_connections(&self) -> bool {
        self.connections_created + self.connections_strengthened > 0
    }
}

pub(crate) fn valid_increment(increment: f64) -> bool {
    increment.is_finite() && increment >= 0.0
}

/// Mutates a `GraphStore` from extracted concept sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateEngine {
    policy: UpdatePolicy,
}

impl UpdateEngine {
    /// Create an update engine with the given policy.
    ///
    /// Fails with [`GraphError::InvalidPolicy`] if the policy could push a
    /// strength outside `[0, 1]`.
    pub fn new(policy: UpdatePolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// The policy in use.
    pub fn policy(&self) -> &UpdatePolicy {
        &self.policy
    }

    /// Apply a document's concept sequence, timestamped now.
    pub fn apply_document(
        &self,
        store: &mut GraphStore,
        document_id: &str,
        concepts: &[String],
    ) -> UpdateSummary {
        self.apply_document_at(store, document_id, concepts, Utc::now())
    }

    /// Apply a document's concept sequence with an explicit timestamp.
    pub fn apply_document_at(
        &self,
        store: &mut GraphStore,
        document_id: &str,
        concepts: &[String],
        at: DateTime<Utc>,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary {
            document_id: document_id.to_string(),
            mentions: concepts.len(),
            ..Default::default()
        };

        for name in concepts {
            let existed = store.contains(name);
            if store.upsert_concept_at(name, at).is_some() && !existed {
                summary.concepts_created += 1;
            }
        }

        let participants = self.participants(concepts);
        for (i, a) in participants.iter().enumerate() {
            for b in &participants[i + 1..] {
                if a == b {
                    continue;
                }
                match store.upsert_connection_with(
                    a,
                    b,
                    document_id,
                    self.policy.initial_strength,
                    self.policy.increment,
                ) {
                    ConnectionUpsert::Created => summary.connections_created += 1,
                    ConnectionUpsert::Strengthened => summary.connections_strengthened += 1,
                    ConnectionUpsert::Rejected => {}
                }
            }
        }

        debug!(
            "Applied document {document_id}: {} mentions, {} new concepts, {} new connections, {} reinforcements",
            summary.mentions,
            summary.concepts_created,
            summary.connections_created,
            summary.connections_strengthened
        );
        summary
    }

    /// The mentions that form pairs under the current policy.
    fn participants<'a>(&self, concepts: &'a [String]) -> Vec<&'a str> {
        match self.policy.mentions {
            MentionPolicy::EveryMention => concepts.iter().map(String::as_str).collect(),
            MentionPolicy::OncePerDocument => {
                let mut seen = HashSet::new();
                concepts
                    .iter()
                    .map(String::as_str)
                    .filter(|name| seen.insert(*name))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_concepts_form_a_triangle() {
        let mut store = GraphStore::new();
        let summary =
            UpdateEngine::default().apply_document(&mut store, "d1", &names(&["A", "B", "C"]));

        assert_eq!(summary.concepts_created, 3);
        assert_eq!(summary.connections_created, 3);
        for (a, b) in [("A", "B"), ("A", "C"), ("B", "C")] {
            assert_eq!(store.connection(a, b).unwrap().strength, 0.5);
        }
    }

    #[test]
    fn test_second_document_strengthens() {
        let mut store = GraphStore::new();
        let engine = UpdateEngine::default();
        engine.apply_document(&mut store, "d1", &names(&["A", "B"]));
        let summary = engine.apply_document(&mut store, "d2", &names(&["A", "B"]));

        assert_eq!(summary.connections_strengthened, 1);
        assert_eq!(store.connection_count(), 1);
        let connection = store.connection("A", "B").unwrap();
        assert_eq!(connection.strength, 0.6);
        assert_eq!(connection.source_document, "d2");
    }

    #[test]
    fn test_single_mention_creates_no_connections() {
        let mut store = GraphStore::new();
        let summary = UpdateEngine::default().apply_document(&mut store, "d1", &names(&["A"]));

        assert!(!summary.changed_connections());
        assert_eq!(store.get_concept("A").unwrap().mention_count, 1);
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn test_repeated_mentions_compound() {
        // A B A: pairs (A,B) (A,A) (B,A) -> created then reinforced once.
        let mut store = GraphStore::new();
        UpdateEngine::default().apply_document(&mut store, "d1", &names(&["A", "B", "A"]));

        assert_eq!(store.get_concept("A").unwrap().mention_count, 2);
        assert_eq!(store.connection("A", "B").unwrap().strength, 0.6);
    }

    #[test]
    fn test_once_per_document_policy() {
        let mut store = GraphStore::new();
        let engine =
            UpdateEngine::new(UpdatePolicy::default().with_mentions(MentionPolicy::OncePerDocument))
                .unwrap();
        engine.apply_document(&mut store, "d1", &names(&["A", "B", "A", "B"]));

        assert_eq!(store.get_concept("A").unwrap().mention_count, 2);
        assert_eq!(store.connection("A", "B").unwrap().strength, 0.5);
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let mut store = GraphStore::new();
        let summary =
            UpdateEngine::default().apply_document(&mut store, "d1", &names(&["", "A", ""]));

        assert_eq!(summary.concepts_created, 1);
        assert_eq!(store.concept_count(), 1);
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn test_policy_rejects_values_outside_strength_bounds() {
        let invalid = [
            UpdatePolicy {
                increment: f64::NAN,
                ..Default::default()
            },
            UpdatePolicy {
                increment: -0.4,
                ..Default::default()
            },
            UpdatePolicy {
                increment: f64::INFINITY,
                ..Default::default()
            },
            UpdatePolicy {
                initial_strength: 1.5,
                ..Default::default()
            },
            UpdatePolicy {
                initial_strength: f64::NAN,
                ..Default::default()
            },
        ];
        for policy in invalid {
            assert!(
                matches!(UpdateEngine::new(policy), Err(GraphError::InvalidPolicy(_))),
                "{policy:?}"
            );
        }
        let engine = UpdateEngine::new(UpdatePolicy::default()).unwrap();
        assert_eq!(engine.policy(), &UpdatePolicy::default());
    }
}
