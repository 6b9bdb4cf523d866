//! copilotd - enterprise knowledge copilot daemon
//!
//! Routes each question to one responder, checks its evidence with the
//! confidence gate and falls back to a clarifying question when the
//! evidence does not hold up.

pub mod config;
pub mod gate;
pub mod ollama;
pub mod orchestrator;
pub mod policy;
pub mod rag;
pub mod responders;
pub mod router;
pub mod routes;
pub mod server;

pub use config::CopilotConfig;
pub use gate::{ConfidenceGate, LowConfidenceReason};
pub use orchestrator::Orchestrator;
pub use rag::{KnowledgeService, RagService};
pub use responders::{Responder, ResponderSet};
pub use router::ResponderKind;
