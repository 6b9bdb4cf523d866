//! Answer types passed between responders, the orchestrator and callers.

use crate::error::CopilotError;
use crate::evidence::{normalize_evidence, EvidenceItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untrusted answer as produced by a retrieval collaborator or responder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    #[serde(rename = "answer", default)]
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Value>,
}

impl RawAnswer {
    pub fn new(text: impl Into<String>, sources: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }

    /// Answer without any supporting evidence
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(text, vec![])
    }

    /// Run the evidence through the normalizer.
    pub fn normalize(self) -> ResponderResult {
        ResponderResult {
            evidence: normalize_evidence(&self.sources),
            text: self.text,
        }
    }
}

/// Responder output after evidence normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponderResult {
    pub text: String,
    pub evidence: Vec<EvidenceItem>,
}

/// Final result handed back to the caller.
///
/// Wire form: `{agent, answer, sources: [{file, score, snippet}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    #[serde(rename = "agent")]
    pub responder_name: String,
    #[serde(rename = "answer")]
    pub text: String,
    #[serde(rename = "sources", default)]
    pub evidence: Vec<EvidenceItem>,
}

impl FinalResult {
    pub fn new(responder_name: impl Into<String>, result: ResponderResult) -> Self {
        Self {
            responder_name: responder_name.into(),
            text: result.text,
            evidence: result.evidence,
        }
    }
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Accepted for compatibility; responders choose their own top-k
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub documents: usize,
    #[serde(default)]
    pub chunks: usize,
}

/// JSON error body returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: String,
}

impl From<&CopilotError> for ErrorBody {
    fn from(e: &CopilotError) -> Self {
        ErrorBody {
            error: e.to_string(),
            code: e.code().to_string(),
        }
    }
}
