//! Tests for the knowledge store over the shipped sample documents

use copilot_shared::knowledge::{
    load_documents, snippet, KnowledgeBase, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    SNIPPET_LENGTH,
};
use std::path::PathBuf;

fn sample_kb() -> KnowledgeBase {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/raw_documents");
    let docs = load_documents(&dir).unwrap();
    KnowledgeBase::from_documents(&docs, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
}

#[test]
fn test_sample_documents_load() {
    let kb = sample_kb();
    let stats = kb.stats();
    assert_eq!(stats.documents, 3);
    assert!(stats.chunks >= 3);
}

#[test]
fn test_canonical_vpn_query_finds_vpn_document() {
    let hits = sample_kb().search("vpn not connecting troubleshooting steps", 2);
    assert_eq!(hits[0].source_id, "vpn_troubleshooting.txt");
    assert!(hits[0].score > 0.0 && hits[0].score < 1.0);
}

#[test]
fn test_canonical_wifi_query_finds_wifi_document() {
    let hits = sample_kb().search("wifi troubleshooting steps", 2);
    assert_eq!(hits[0].source_id, "wifi_troubleshooting.txt");
}

#[test]
fn test_leave_question_finds_policy() {
    let hits = sample_kb().search("how many days of annual leave", 2);
    assert_eq!(hits[0].source_id, "hr_leave_policy.md");
}

#[test]
fn test_scores_best_first() {
    let hits = sample_kb().search("troubleshooting steps", 3);
    assert!(hits.len() >= 2);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_unrelated_query_has_no_hits() {
    assert!(sample_kb().search("parking berlin", 4).is_empty());
}

#[test]
fn test_snippets_bounded() {
    for hit in sample_kb().search("vpn wifi leave", 4) {
        assert!(snippet(&hit.text).chars().count() <= SNIPPET_LENGTH + 3);
    }
}
