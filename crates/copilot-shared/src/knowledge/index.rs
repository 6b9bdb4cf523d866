//! Keyword index over knowledge chunks.
//!
//! Inverted index with BM25-lite scoring. Deterministic: ties are broken by
//! chunk id.

use std::collections::HashMap;

use super::chunker::{chunk_document, Chunk};
use super::loader::Document;
use super::IngestStats;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Tokenize text into searchable tokens (deterministic)
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
        .filter(|s| s.len() >= 2)
        .map(String::from)
        .collect()
}

/// Inverted index entry
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub doc_ids: Vec<String>,
    /// Term frequency in each document (parallel to doc_ids)
    pub term_freqs: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    pub index: HashMap<String, PostingList>,
    pub doc_lengths: HashMap<String, u32>,
    pub avg_doc_length: f32,
    pub doc_count: u32,
    /// Running sum of `doc_lengths`
    total_length: u64,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document; re-adding an id replaces its term frequencies
    pub fn add_document(&mut self, doc_id: &str, text: &str) {
        let tokens = tokenize(text);

        let len = tokens.len() as u32;
        if let Some(old) = self.doc_lengths.insert(doc_id.to_string(), len) {
            self.total_length -= u64::from(old);
        }
        self.total_length += u64::from(len);
        self.doc_count = self.doc_lengths.len() as u32;
        self.avg_doc_length = if self.doc_count > 0 {
            self.total_length as f32 / self.doc_count as f32
        } else {
            0.0
        };

        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *term_counts.entry(token).or_insert(0) += 1;
        }

        for (token, freq) in term_counts {
            let posting = self.index.entry(token).or_default();
            if let Some(pos) = posting.doc_ids.iter().position(|id| id == doc_id) {
                posting.term_freqs[pos] = freq;
            } else {
                posting.doc_ids.push(doc_id.to_string());
                posting.term_freqs.push(freq);
            }
        }
    }

    /// Raw BM25 scores, best first
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, f32)> {
        let mut query_tokens = tokenize(query);
        query_tokens.sort();
        query_tokens.dedup();
        if query_tokens.is_empty() {
            return vec![];
        }

        let mut scores: HashMap<String, f32> = HashMap::new();

        for token in &query_tokens {
            if let Some(posting) = self.index.get(token) {
                // IDF: log((N - n + 0.5) / (n + 0.5) + 1)
                let n = posting.doc_ids.len() as f32;
                let idf = ((self.doc_count as f32 - n + 0.5) / (n + 0.5) + 1.0).ln();

                for (doc_id, &tf) in posting.doc_ids.iter().zip(posting.term_freqs.iter()) {
                    let doc_len = *self.doc_lengths.get(doc_id).unwrap_or(&1) as f32;
                    let norm = 1.0 - B + B * (doc_len / self.avg_doc_length.max(1.0));
                    let tf_score = (tf as f32 * (K1 + 1.0)) / (tf as f32 + K1 * norm);
                    *scores.entry(doc_id.clone()).or_insert(0.0) += idf * tf_score;
                }
            }
        }

        let mut results: Vec<(String, f32)> = scores.into_iter().collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results.truncate(limit);
        results
    }

}

/// A ranked chunk
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_id: String,
    pub source_id: String,
    /// Normalized into [0, 1): `s / (s + 1)` of the BM25 score
    pub score: f64,
    pub text: String,
}

/// Chunks plus their keyword index
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    index: KeywordIndex,
    chunks: HashMap<String, Chunk>,
    documents: usize,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk and index a document set
    pub fn from_documents(docs: &[Document], chunk_size: usize, overlap: usize) -> Self {
        let mut kb = Self::new();
        for doc in docs {
            kb.add_document(doc, chunk_size, overlap);
        }
        kb
    }

    pub fn add_document(&mut self, doc: &Document, chunk_size: usize, overlap: usize) {
        for chunk in chunk_document(doc, chunk_size, overlap) {
            self.index.add_document(&chunk.id, &chunk.text);
            self.chunks.insert(chunk.id.clone(), chunk);
        }
        self.documents += 1;
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        self.index
            .search(query, k)
            .into_iter()
            .filter_map(|(id, raw)| {
                self.chunks.get(&id).map(|chunk| SearchHit {
                    chunk_id: id,
                    source_id: chunk.source_id.clone(),
                    score: normalize_score(raw),
                    text: chunk.text.clone(),
                })
            })
            .collect()
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            documents: self.documents,
            chunks: self.chunks.len(),
        }
    }
}

fn normalize_score(raw: f32) -> f64 {
    let raw = f64::from(raw.max(0.0));
    raw / (raw + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Hello World! This is a test_token and wi-fi.");
        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"test_token".to_string()));
        assert!(tokens.contains(&"wi-fi".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
    }

    #[test]
    fn test_index_and_search() {
        let mut index = KeywordIndex::new();
        index.add_document("doc1", "how to reset the vpn client");
        index.add_document("doc2", "how to join the wifi network");
        index.add_document("doc3", "annual leave policy");

        let results = index.search("vpn", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "doc1");

        let results = index.search("how to", 10);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_average_length_tracks_replacements() {
        let mut index = KeywordIndex::new();
        index.add_document("doc1", "one two three four");
        index.add_document("doc2", "one two");
        assert_eq!(index.doc_count, 2);
        assert_eq!(index.avg_doc_length, 3.0);

        // Re-adding an id swaps its length instead of counting it twice
        index.add_document("doc1", "one two three four five six");
        assert_eq!(index.doc_count, 2);
        assert_eq!(index.avg_doc_length, 4.0);

        for i in 0..100 {
            index.add_document(&format!("extra{}", i), "one two");
        }
        assert_eq!(index.doc_count, 102);
        assert_eq!(index.avg_doc_length, (6.0 + 2.0 + 200.0) / 102.0);
    }

    #[test]
    fn test_deterministic_tie_break() {
        let mut index = KeywordIndex::new();
        index.add_document("ccc", "test document");
        index.add_document("aaa", "test document");
        index.add_document("bbb", "test document");

        let results = index.search("test document", 10);
        let ids: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn test_knowledge_base_hits_carry_source() {
        let docs = vec![
            Document::new("vpn_guide.txt", "vpn_guide.txt", "If the VPN is not connecting, restart the client."),
            Document::new("hr_leave_policy.txt", "hr_leave_policy.txt", "Annual leave is 25 days per year."),
        ];
        let kb = KnowledgeBase::from_documents(&docs, 512, 64);
        assert_eq!(kb.stats(), IngestStats { documents: 2, chunks: 2 });

        let hits = kb.search("vpn not connecting", 2);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_id, "vpn_guide.txt");
        assert!(hits[0].score > 0.0 && hits[0].score < 1.0);
    }

    #[test]
    fn test_empty_query_no_hits() {
        let kb = KnowledgeBase::from_documents(&[Document::new("a", "a", "some text")], 512, 64);
        assert!(kb.search("", 3).is_empty());
        assert!(kb.search("?", 3).is_empty());
    }
}
