//! Plain-text rendering of query results.

use std::fmt::Write as _;

use notegraph_graph::{
    Cluster, Concept, ConceptRank, Connection, GraphStats, ResultKind, SearchResult,
    StrengthBand, StrengthGroups, UpdateSummary,
};
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn stats(stats: &GraphStats) -> String {
    format!(
        "Concepts:    {}\nConnections: {}\nDensity:     {}%\nStrong:      {}\nMedium:      {}\nWeak:        {}\nMentions:    {}",
        stats.concept_count,
        stats.connection_count,
        stats.density,
        stats.strong,
        stats.medium,
        stats.weak,
        stats.total_mentions
    )
}

pub fn ranks(ranks: &[ConceptRank]) -> String {
    let mut out = String::new();
    for (i, rank) in ranks.iter().enumerate() {
        let noun = if rank.connections == 1 {
            "connection"
        } else {
            "connections"
        };
        let _ = writeln!(out, "{:>3}. {} ({} {noun})", i + 1, rank.name, rank.connections);
    }
    out
}

pub fn groups(groups: &StrengthGroups) -> String {
    let mut out = String::new();
    for (band, connections) in [
        (StrengthBand::Strong, &groups.strong),
        (StrengthBand::Medium, &groups.medium),
        (StrengthBand::Weak, &groups.weak),
    ] {
        let _ = writeln!(out, "{} ({})", band.label(), connections.len());
        for connection in connections {
            let _ = writeln!(out, "  {}", connection_line(connection));
        }
    }
    out
}

pub fn clusters(clusters: &[Cluster]) -> String {
    let mut out = String::new();
    for cluster in clusters {
        let _ = writeln!(
            out,
            "{} (density {}%): {}",
            cluster.hub,
            cluster.density,
            cluster.members.join(", ")
        );
    }
    out
}

pub fn search_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for result in results {
        let kind = match result.kind {
            ResultKind::Concept => "concept",
            ResultKind::Connection => "connection",
        };
        let _ = writeln!(out, "[{kind}] {}  {:.2}", result.title, result.relevance);
    }
    out
}

pub fn concept(concept: &Concept, connections: &[Connection]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", concept.name);
    let _ = writeln!(out, "  mentions:     {}", concept.mention_count);
    let _ = writeln!(out, "  last updated: {}", concept.last_updated.to_rfc3339());
    if let Some(description) = &concept.description {
        let _ = writeln!(out, "  description:  {description}");
    }
    let _ = writeln!(out, "  connections:  {}", connections.len());
    for connection in connections {
        let _ = writeln!(out, "    {}", connection_line(connection));
    }
    out
}

pub fn summary(summary: &UpdateSummary) -> String {
    format!(
        "{}: {} mentions, {} new concepts, {} new connections, {} reinforced",
        summary.document_id,
        summary.mentions,
        summary.concepts_created,
        summary.connections_created,
        summary.connections_strengthened
    )
}

fn connection_line(connection: &Connection) -> String {
    format!(
        "{}  {:.2} ({})",
        connection.display(),
        connection.strength,
        connection.source_document
    )
}
