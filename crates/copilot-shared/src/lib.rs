//! Shared types and utilities for the knowledge copilot components.

pub mod answer;
pub mod error;
pub mod evidence;
pub mod knowledge;

pub use answer::{
    AskRequest, ErrorBody, FinalResult, HealthResponse, IngestResponse, RawAnswer, ReadyResponse,
    ResponderResult,
};
pub use error::{CopilotError, Result};
pub use evidence::{max_score, normalize_evidence, EvidenceItem, UNKNOWN_SOURCE};

/// Crate version shared by daemon and CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API address the CLI talks to
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
