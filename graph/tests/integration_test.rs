//! Integration tests for the concept graph.
//!
//! These exercise the full path from document text to graph queries and
//! check the graph invariants across many updates.

use std::collections::HashSet;

use notegraph_graph::{
    AnalyticsEngine, ConceptExtractor, GraphState, GraphStore, PairKey, ResultKind,
    SearchEngine, UpdateEngine,
};
use pretty_assertions::assert_eq;

/// Extract and apply one document.
fn ingest(store: &mut GraphStore, document_id: &str, text: &str) {
    let concepts = ConceptExtractor::new().extract(text);
    UpdateEngine::default().apply_document(store, document_id, &concepts);
}

fn assert_invariants(store: &GraphStore) {
    let mut pairs = HashSet::new();
    for connection in store.connections() {
        assert!(store.contains(&connection.a), "dangling endpoint {}", connection.a);
        assert!(store.contains(&connection.b), "dangling endpoint {}", connection.b);
        assert_ne!(connection.a, connection.b, "self-loop on {}", connection.a);
        assert!(
            (0.0..=1.0).contains(&connection.strength),
            "strength {} out of range",
            connection.strength
        );
        assert!(
            pairs.insert(PairKey::new(&connection.a, &connection.b)),
            "duplicate pair {connection}"
        );
    }
    for concept in store.concepts() {
        assert!(concept.mention_count >= 1);
        assert!(!concept.name.is_empty());
    }
}

#[test]
fn test_invariants_hold_across_many_documents() {
    let vocabulary = ["Rust", "Tokio", "Serde", "rust", "Graph", "Notes", "Tokio"];
    let mut store = GraphStore::new();

    // Deterministic pseudo-random documents.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for doc in 0..200 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;

        let len = (seed % 9) as usize;
        let text: String = (0..len)
            .map(|i| {
                let word = vocabulary[((seed >> (i * 5)) as usize) % vocabulary.len()];
                format!("some text [[{word}]] ")
            })
            .collect();

        ingest(&mut store, &format!("doc-{doc}"), &text);
        assert_invariants(&store);

        // Administrative deletes must cascade.
        if doc % 50 == 49 {
            store.delete_concept("Serde");
            assert_invariants(&store);
        }
    }
}

#[test]
fn test_strength_is_monotonic_and_capped() {
    let mut store = GraphStore::new();
    let mut previous = 0.0;
    for round in 1..=10 {
        let text = "[[A]] [[B]] ".repeat(round);
        ingest(&mut store, "same-doc", &text);

        let strength = store.connection("A", "B").unwrap().strength;
        assert!(strength >= previous, "strength decreased in round {round}");
        assert!(strength <= 1.0);
        previous = strength;
    }
    assert_eq!(previous, 1.0);
}

#[test]
fn test_single_reference_document() {
    let mut store = GraphStore::new();
    ingest(&mut store, "d1", "Only [[Lonely]] here, and an [[unterminated");

    assert_eq!(store.concept_count(), 1);
    assert_eq!(store.connection_count(), 0);
}

#[test]
fn test_triangle_document_end_to_end() {
    let mut store = GraphStore::new();
    ingest(&mut store, "d1", "[[A]] relates to [[B]] and [[C]]");
    let analytics = AnalyticsEngine::new(&store);

    assert_eq!(store.connection_count(), 3);
    assert!(store.connections().all(|c| c.strength == 0.5));
    assert_eq!(analytics.connection_count("A"), 2);
    assert_eq!(analytics.density(), 100);
    assert_eq!(analytics.clusters().len(), 1);
}

#[test]
fn test_two_documents_reinforce() {
    let mut store = GraphStore::new();
    ingest(&mut store, "d1", "[[A]] [[B]]");
    ingest(&mut store, "d2", "[[B]] then [[A]]");

    assert_eq!(store.connection_count(), 1);
    let connection = store.connection("A", "B").unwrap();
    assert_eq!(connection.strength, 0.6);
    assert_eq!(connection.source_document, "d2");
    assert_eq!(store.get_concept("A").unwrap().mention_count, 2);
}

#[test]
fn test_search_after_ingest() {
    let mut store = GraphStore::new();
    ingest(&mut store, "fruit", "[[Apple]] pairs with [[Banana]]");

    let results = SearchEngine::new(&store).search("app");
    let summary: Vec<(ResultKind, &str, f64)> = results
        .iter()
        .map(|r| (r.kind, r.title.as_str(), r.relevance))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ResultKind::Concept, "Apple", 0.8),
            (ResultKind::Connection, "Apple ↔ Banana", 0.6),
        ]
    );
}

#[test]
fn test_state_survives_json() {
    let mut store = GraphStore::new();
    ingest(&mut store, "d1", "[[A]] [[B]] [[C]]");
    ingest(&mut store, "d2", "[[C]] [[D]]");

    let json = store.export_state().to_json().unwrap();
    let restored = GraphStore::import_state(GraphState::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored, store);
    let names: Vec<&str> = restored.concepts().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert_eq!(
        AnalyticsEngine::new(&restored).most_connected(Some(1))[0].name,
        "C"
    );
}
