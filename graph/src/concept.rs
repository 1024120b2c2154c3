//! Concept and connection types.
//!
//! Concepts are keyed by their literal name. Connections are weighted,
//! undirected edges between two distinct concepts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strength at or above which a connection is considered strong.
pub const STRONG_THRESHOLD: f64 = 0.8;

/// Strength at or above which a connection is considered medium.
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// A concept registered in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concept {
    /// The concept name (unique, case-sensitive key).
    pub name: String,

    /// How many times the concept has been referenced. Always at least 1.
    pub mention_count: u32,

    /// When the concept was last referenced.
    pub last_updated: DateTime<Utc>,

    /// Optional user-written description. Never touched by extraction.
    pub description: Option<String>,
}

impl Concept {
    /// Create a concept for its first mention.
    pub fn new(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            mention_count: 1,
            last_updated: at,
            description: None,
        }
    }

    /// Record another mention.
    pub(crate) fn mention(&mut self, at: DateTime<Utc>) {
        self.mention_count = self.mention_count.saturating_add(1);
        self.last_updated = at;
    }
}

/// Identity of a connection: the unordered pair of its endpoints.
///
/// The pair is stored in lexicographic order so `(a, b)` and `(b, a)`
/// produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    /// Build the key for an unordered pair.
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// Whether the pair would be a self-loop.
    pub fn is_loop(&self) -> bool {
        self.low == self.high
    }

    /// Whether `name` is one of the endpoints.
    pub fn contains(&self, name: &str) -> bool {
        self.low == name || self.high == name
    }
}

/// A weighted, undirected edge between two concepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    /// First endpoint, as seen on first co-occurrence.
    pub a: String,

    /// Second endpoint.
    pub b: String,

    /// Accumulated co-occurrence evidence (0.0 to 1.0).
    pub strength: f64,

    /// Document that most recently reinforced this connection.
    pub source_document: String,
}

impl Connection {
    /// Create a connection. Returns `None` for a self-loop.
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        strength: f64,
        source_document: impl Into<String>,
    ) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return None;
        }
        Some(Self {
            a,
            b,
            strength: strength.clamp(0.0, 1.0),
            source_document: source_document.into(),
        })
    }

    /// The unordered identity of this connection.
    pub fn key(&self) -> PairKey {
        PairKey::new(&self.a, &self.b)
    }

    /// Whether `name` is an endpoint.
    pub fn involves(&self, name: &str) -> bool {
        self.a == name || self.b == name
    }

    /// The endpoint opposite to `name`, if `name` is an endpoint.
    pub fn other(&self, name: &str) -> Option<&str> {
        if self.a == name {
            Some(&self.b)
        } else if self.b == name {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Which strength band this connection falls in.
    pub fn band(&self) -> StrengthBand {
        StrengthBand::of(self.strength)
    }

    /// Display form, `"a ↔ b"`.
    pub fn display(&self) -> String {
        format!("{} ↔ {}", self.a, self.b)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ↔ {} ({:.2})", self.a, self.b, self.strength)
    }
}

/// Strength classification of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthBand {
    /// `strength >= 0.8`.
    Strong,

    /// `0.5 <= strength < 0.8`.
    Medium,

    /// `strength < 0.5`.
    Weak,
}

impl StrengthBand {
    /// Classify a strength value.
    pub fn of(strength: f64) -> Self {
        if strength >= STRONG_THRESHOLD {
            Self::Strong
        } else if strength >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Weak
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Medium => "medium",
            Self::Weak => "weak",
        }
    }
}
