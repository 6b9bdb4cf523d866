//! Error types for the copilot.
//!
//! Malformed evidence and missing scores never show up here: the normalizer
//! repairs them in place. Only hard collaborator failures and setup problems
//! are surfaced.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Request refused: {0}")]
    PolicyBlocked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CopilotError {
    /// True when the failure came from the retrieval or generation service.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, CopilotError::Retrieval(_) | CopilotError::Generation(_))
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CopilotError::Retrieval(_) => "retrieval_failed",
            CopilotError::Generation(_) => "generation_failed",
            CopilotError::Config(_) => "config_invalid",
            CopilotError::PolicyBlocked(_) => "policy_blocked",
            CopilotError::Io(_) => "io_error",
            CopilotError::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CopilotError>;
