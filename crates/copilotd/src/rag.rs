//! Retrieval + generation service used by the retrieving responders.
//!
//! Searches the knowledge base, turns hits into `{file, score, snippet}`
//! sources and asks the generator for a grounded answer.

use copilot_shared::knowledge::{self, load_documents, IngestStats, KnowledgeBase};
use copilot_shared::{CopilotError, RawAnswer, Result};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::ollama::Generator;

/// `ask(question, top_k) -> {text, evidence}`, evidence best-first
pub trait KnowledgeService: Send + Sync {
    fn ask(&self, question: &str, top_k: usize) -> Result<RawAnswer>;
}

pub struct RagService {
    kb: RwLock<KnowledgeBase>,
    generator: Arc<dyn Generator>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RagService {
    pub fn new(generator: Arc<dyn Generator>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            kb: RwLock::new(KnowledgeBase::new()),
            generator,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Rebuild the knowledge base from a directory, replacing the old one.
    ///
    /// An empty directory leaves the current knowledge base untouched and
    /// reports zero documents.
    pub fn ingest_dir(&self, dir: &Path) -> Result<IngestStats> {
        let docs = load_documents(dir)?;
        if docs.is_empty() {
            warn!("No documents found in {}", dir.display());
            return Ok(IngestStats::default());
        }

        let kb = KnowledgeBase::from_documents(&docs, self.chunk_size, self.chunk_overlap);
        let stats = kb.stats();

        let mut guard = self
            .kb
            .write()
            .map_err(|_| CopilotError::Retrieval("knowledge base lock poisoned".to_string()))?;
        *guard = kb;

        info!(
            "Ingested {} documents ({} chunks) from {}",
            stats.documents,
            stats.chunks,
            dir.display()
        );
        Ok(stats)
    }

    pub fn stats(&self) -> Result<IngestStats> {
        self.kb
            .read()
            .map(|kb| kb.stats())
            .map_err(|_| CopilotError::Retrieval("knowledge base lock poisoned".to_string()))
    }

    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }
}

impl KnowledgeService for RagService {
    fn ask(&self, question: &str, top_k: usize) -> Result<RawAnswer> {
        let hits = {
            let kb = self
                .kb
                .read()
                .map_err(|_| CopilotError::Retrieval("knowledge base lock poisoned".to_string()))?;
            kb.search(question, top_k)
        };

        debug!("Retrieved {} hits for top_k={}", hits.len(), top_k);

        let snippets: Vec<String> = hits.iter().map(|h| knowledge::snippet(&h.text)).collect();
        let sources = hits
            .iter()
            .zip(&snippets)
            .map(|(hit, snippet)| {
                json!({
                    "file": hit.source_id,
                    "score": hit.score,
                    "snippet": snippet,
                })
            })
            .collect();

        let context = snippets.join("\n\n");
        let answer = self.generator.complete(&build_prompt(question, &context))?;

        Ok(RawAnswer::new(answer, sources))
    }
}

/// Grounded answer prompt
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an enterprise knowledge assistant.\n\
         Use ONLY the context below.\n\
         If the context is not enough, say: 'Not found in knowledge base' and ask ONE clarifying question.\n\n\
         Rules:\n\
         - Extract steps ONLY from the context. Do not invent new steps.\n\
         - If the context lists multiple items, include ALL of them.\n\
         - Keep each step to one line.\n\n\
         Context:\n{}\n\n\
         Output format (MUST follow):\n\
         Summary: <one sentence>\n\
         Steps:\n\
         - <step 1>\n\
         - <step N>\n\
         Done.\n\n\
         Formatting rules:\n\
         - Each step MUST start with '- '.\n\
         User question: {}\n",
        context, question
    )
}
