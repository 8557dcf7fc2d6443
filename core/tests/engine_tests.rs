use std::collections::HashMap;

use cinedex_core::tokenizer::normalize_field;
use cinedex_core::{Document, Field, InvertedIndex, Scoring, SearchEngine, TierStop};

fn doc(id: &str, stars: &[&str], genres: &[&str], summaries: &[&str]) -> Document {
    let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Document {
        id: id.into(),
        title: id.to_uppercase(),
        stars: normalize_field(&owned(stars)),
        genres: normalize_field(&owned(genres)),
        summaries: normalize_field(&owned(summaries)),
    }
}

fn movie_corpus() -> Vec<Document> {
    vec![
        doc(
            "tt1",
            &["Tim Robbins", "Morgan Freeman"],
            &["Drama"],
            &["Two imprisoned men bond over many years finding redemption"],
        ),
        doc(
            "tt2",
            &["Marlon Brando", "Al Pacino"],
            &["Crime", "Drama"],
            &["An aging patriarch transfers control of his crime empire"],
        ),
        doc(
            "tt3",
            &["Christian Bale"],
            &["Action", "Crime"],
            &["A masked vigilante battles crime in a sprawling city"],
        ),
    ]
}

fn weights(entries: &[(Field, f64)]) -> HashMap<Field, f64> {
    entries.iter().copied().collect()
}

#[test]
fn search_ranks_matching_documents() {
    let engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    let w = weights(&[(Field::Summaries, 1.0), (Field::Genres, 1.0)]);
    let scoring: Scoring = "lnc.ltc".parse().unwrap();

    let results = engine.search("crime empire", scoring, &w, true, Some(10));
    assert!(!results.is_empty());
    assert_eq!(results[0].0, "tt2");
    assert!(results.iter().all(|(_, score)| *score > 0.0));
}

#[test]
fn missing_field_scores_contribute_zero() {
    let engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    let w = weights(&[(Field::Summaries, 1.0), (Field::Stars, 1.0)]);

    // "redemption" only matches tt1's summary; tt1 still ranks even
    // though its stars contribute nothing.
    let results = engine.search("redemption", "lnc.ltc".parse().unwrap(), &w, true, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "tt1");
}

#[test]
fn empty_query_returns_empty_ranking() {
    let engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    let w = weights(&[(Field::Summaries, 1.0)]);
    assert!(engine.search("", "lnc.ltc".parse().unwrap(), &w, true, None).is_empty());
    // Stopword-only queries tokenize to nothing.
    assert!(engine.search("the of and", "OkapiBM25".parse().unwrap(), &w, true, None).is_empty());
}

#[test]
fn max_results_boundaries() {
    let engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    let w = weights(&[(Field::Genres, 1.0)]);
    let scoring: Scoring = "OkapiBM25".parse().unwrap();

    assert!(engine.search("crime drama", scoring, &w, true, Some(0)).is_empty());

    let unbounded = engine.search("crime drama", scoring, &w, true, None);
    assert_eq!(unbounded.len(), 3);

    let capped = engine.search("crime drama", scoring, &w, true, Some(2));
    assert_eq!(capped.len(), 2);
    assert_eq!(capped, unbounded[..2].to_vec());
}

#[test]
fn doubling_weights_doubles_scores_and_preserves_order() {
    let engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    let scoring: Scoring = "OkapiBM25".parse().unwrap();
    let single = weights(&[(Field::Summaries, 1.0), (Field::Genres, 2.0)]);
    let double = weights(&[(Field::Summaries, 2.0), (Field::Genres, 4.0)]);

    let base = engine.search("crime city", scoring, &single, true, None);
    let scaled = engine.search("crime city", scoring, &double, true, None);

    assert_eq!(base.len(), scaled.len());
    for ((id_a, score_a), (id_b, score_b)) in base.iter().zip(&scaled) {
        assert_eq!(id_a, id_b);
        assert!((score_b - 2.0 * score_a).abs() < 1e-9);
    }
}

#[test]
fn safe_and_unsafe_agree_when_tiering_is_trivial() {
    // Every term occurs in exactly one document, so each posting fits
    // entirely in the first tier and tier-local df equals global df.
    let docs = vec![
        doc("tt1", &[], &[], &["wizard wizard wizard"]),
        doc("tt2", &[], &[], &["dragon dragon"]),
        doc("tt3", &[], &[], &["castle"]),
        doc("tt4", &[], &[], &["moat"]),
    ];
    let engine = SearchEngine::new(InvertedIndex::build(docs));
    let w = weights(&[(Field::Summaries, 1.0)]);

    for method in ["OkapiBM25", "lnc.ltc", "nnn.nnn", "ltc.lnc"] {
        let scoring: Scoring = method.parse().unwrap();
        let safe = engine.search("wizard dragon castle", scoring, &w, true, None);
        let tiered = engine.search("wizard dragon castle", scoring, &w, false, None);
        assert_eq!(safe.len(), tiered.len(), "method {method}");
        for ((id_a, score_a), (id_b, score_b)) in safe.iter().zip(&tiered) {
            assert_eq!(id_a, id_b, "method {method}");
            assert!((score_a - score_b).abs() < 1e-9, "method {method}");
        }
    }
}

#[test]
fn unsafe_ranking_stops_at_satisfied_tiers() {
    // "hit" spans all three tiers; an eighth document keeps idf > 0.
    let mut docs: Vec<Document> = (1..=6)
        .map(|i| doc(&format!("tt{i}"), &[], &[], &[&vec!["hit"; i].join(" ")]))
        .collect();
    docs.push(doc("tt7", &[], &[], &["unrelated summary text"]));
    let engine = SearchEngine::new(InvertedIndex::build(docs));
    let w = weights(&[(Field::Summaries, 1.0)]);
    let scoring: Scoring = "OkapiBM25".parse().unwrap();

    let capped = engine.search("hit", scoring, &w, false, Some(2));
    assert_eq!(capped.len(), 2);
    // Only the first tier (highest tf) gets examined, so low-tf
    // documents living in lower tiers never enter the result.
    let ids: Vec<&str> = capped.iter().map(|(id, _)| id.as_str()).collect();
    assert!(ids.contains(&"tt6"));
    assert!(ids.contains(&"tt5"));

    let full = engine.search("hit", scoring, &w, false, None);
    assert_eq!(full.len(), 6);
}

#[test]
fn aggregate_tier_stop_scans_all_tiers_without_a_cap() {
    let docs = vec![
        doc("tt1", &[], &[], &["wizard wizard wizard"]),
        doc("tt2", &[], &[], &["dragon dragon"]),
        doc("tt3", &[], &[], &["castle"]),
    ];
    let per_field = SearchEngine::new(InvertedIndex::build(docs.clone()));
    let aggregate =
        SearchEngine::new(InvertedIndex::build(docs)).tier_stop(TierStop::Aggregate);
    let w = weights(&[(Field::Summaries, 1.0)]);
    let scoring: Scoring = "OkapiBM25".parse().unwrap();

    let a = per_field.search("wizard dragon castle", scoring, &w, false, None);
    let b = aggregate.search("wizard dragon castle", scoring, &w, false, None);
    assert_eq!(a, b);
}

#[test]
fn mutation_refreshes_derived_tables() {
    let mut engine = SearchEngine::new(InvertedIndex::build(movie_corpus()));
    assert_eq!(engine.metadata().document_count, 3);

    engine.add(doc("tt4", &[], &["Drama"], &["a courtroom drama of redemption"]));
    assert_eq!(engine.metadata().document_count, 4);
    let w = weights(&[(Field::Summaries, 1.0)]);
    let results = engine.search("redemption", "OkapiBM25".parse().unwrap(), &w, true, None);
    assert_eq!(results.len(), 2);

    engine.remove("tt4");
    assert_eq!(engine.metadata().document_count, 3);
    let results = engine.search("redemption", "OkapiBM25".parse().unwrap(), &w, true, None);
    assert_eq!(results.len(), 1);
}
