//! Request policy screen - refuses questions asking for secrets.
//!
//! Opt-in via `[policy] block_sensitive`; runs before orchestration.

use copilot_shared::{CopilotError, Result};

/// Terms that mark a request for credentials or payment data
pub const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "otp",
    "secret",
    "api key",
    "token",
    "private key",
    "credit card",
    "cvv",
];

/// Err(PolicyBlocked) naming the first sensitive term found
pub fn screen(question: &str) -> Result<()> {
    let q = question.to_lowercase();
    match SENSITIVE_TERMS.iter().find(|term| q.contains(*term)) {
        Some(term) => Err(CopilotError::PolicyBlocked(format!(
            "Sensitive request detected: '{}'",
            term
        ))),
        None => Ok(()),
    }
}
