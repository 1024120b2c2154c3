//! Read-only structural queries over a `GraphStore`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::concept::{Connection, StrengthBand};
use crate::store::GraphStore;

/// Connections partitioned by strength band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthGroups {
    /// `strength >= 0.8`.
    pub strong: Vec<Connection>,

    /// `0.5 <= strength < 0.8`.
    pub medium: Vec<Connection>,

    /// `strength < 0.5`.
    pub weak: Vec<Connection>,
}

/// A concept together with its connection count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRank {
    pub name: String,
    pub connections: usize,
}

/// A one-hop neighbourhood reported as a loosely related group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// The concept the neighbourhood was built around.
    pub hub: String,

    /// Hub first, then its neighbours in connection order.
    pub members: Vec<String>,

    /// `round(100 * connections(hub) / members.len())`.
    pub density: u32,
}

/// Summary statistics about the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub concept_count: usize,
    pub connection_count: usize,
    pub density: u32,
    pub strong: usize,
    pub medium: usize,
    pub weak: usize,
    pub total_mentions: u64,
}

/// Structural analytics: connection counts, grouping, density, ranking
/// and clustering.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine<'a> {
    store: &'a GraphStore,
}

impl<'a> AnalyticsEngine<'a> {
    /// Create an analytics view over a store.
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Number of connections touching `name`.
    pub fn connection_count(&self, name: &str) -> usize {
        self.store
            .connections()
            .filter(|connection| connection.involves(name))
            .count()
    }

    /// Partition all connections by strength band.
    pub fn group_by_strength(&self) -> StrengthGroups {
        let mut groups = StrengthGroups::default();
        for connection in self.store.connections() {
            let bucket = match connection.band() {
                StrengthBand::Strong => &mut groups.strong,
                StrengthBand::Medium => &mut groups.medium,
                StrengthBand::Weak => &mut groups.weak,
            };
            bucket.push(connection.clone());
        }
        groups
    }

    /// Percentage of all possible concept pairs that are connected.
    ///
    /// Fewer than two concepts yield 0.
    pub fn density(&self) -> u32 {
        let n = self.store.concept_count();
        if n < 2 {
            return 0;
        }
        percent(self.store.connection_count(), n * (n - 1) / 2)
    }

    /// Concepts ordered by connection count, highest first.
    ///
    /// Ties keep concept insertion order.
    pub fn most_connected(&self, limit: Option<usize>) -> Vec<ConceptRank> {
        let degrees = self.degrees();
        let mut ranked: Vec<ConceptRank> = self
            .store
            .concepts()
            .map(|concept| ConceptRank {
                name: concept.name.clone(),
                connections: degrees.get(concept.name.as_str()).copied().unwrap_or(0),
            })
            .collect();

        // Stable, so equal counts stay in insertion order.
        ranked.sort_by(|a, b| b.connections.cmp(&a.connections));

        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }

    /// One-hop star clusters.
    ///
    /// Concepts are visited in insertion order. An unprocessed concept with
    /// at least two neighbours forms a cluster with them, and every member
    /// is marked processed. Otherwise only the concept itself is marked.
    pub fn clusters(&self) -> Vec<Cluster> {
        let mut processed: HashSet<&str> = HashSet::new();
        let mut clusters = Vec::new();

        for concept in self.store.concepts() {
            let hub = concept.name.as_str();
            if processed.contains(hub) {
                continue;
            }

            let incident = self.store.connections_of(hub);
            let mut members = vec![hub];
            for connection in &incident {
                if let Some(other) = connection.other(hub) {
                    if !members.contains(&other) {
                        members.push(other);
                    }
                }
            }

            if members.len() > 2 {
                let density = percent(incident.len(), members.len());
                processed.extend(members.iter().copied());
                clusters.push(Cluster {
                    hub: hub.to_string(),
                    members: members.iter().map(|m| m.to_string()).collect(),
                    density,
                });
            } else {
                processed.insert(hub);
            }
        }

        clusters
    }

    /// Summary statistics.
    pub fn stats(&self) -> GraphStats {
        let groups = self.group_by_strength();
        GraphStats {
            concept_count: self.store.concept_count(),
            connection_count: self.store.connection_count(),
            density: self.density(),
            strong: groups.strong.len(),
            medium: groups.medium.len(),
            weak: groups.weak.len(),
            total_mentions: self
                .store
                .concepts()
                .map(|concept| u64::from(concept.mention_count))
                .sum(),
        }
    }

    /// Connection count per concept, in a single pass over the edges.
    fn degrees(&self) -> HashMap<&'a str, usize> {
        let mut degrees = HashMap::new();
        for connection in self.store.connections() {
            *degrees.entry(connection.a.as_str()).or_insert(0) += 1;
            *degrees.entry(connection.b.as_str()).or_insert(0) += 1;
        }
        degrees
    }
}

/// `round(100 * numerator / denominator)`, half up, in integer arithmetic
/// so exact halves are never lost to float error.
fn percent(numerator: usize, denominator: usize) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let (numerator, denominator) = (numerator as u64, denominator as u64);
    ((200 * numerator + denominator) / (2 * denominator)) as u32
}
