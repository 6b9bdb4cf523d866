//! Knowledge store: document loading, chunking and keyword retrieval.
//!
//! This is the retrieval collaborator behind the RAG service. It ranks
//! chunks, the copilot core never does.

pub mod chunker;
pub mod index;
pub mod loader;

pub use chunker::{chunk_document, Chunk};
pub use index::{tokenize, KeywordIndex, KnowledgeBase, SearchHit};
pub use loader::{load_documents, Document};

use serde::{Deserialize, Serialize};

/// Default chunk window in characters
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 64;

/// Maximum snippet length handed back as evidence
pub const SNIPPET_LENGTH: usize = 240;

/// Counts reported after an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub documents: usize,
    pub chunks: usize,
}

/// Cut text to `SNIPPET_LENGTH` characters, marking truncation with "...".
pub fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_LENGTH {
        let cut: String = text.chars().take(SNIPPET_LENGTH).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
