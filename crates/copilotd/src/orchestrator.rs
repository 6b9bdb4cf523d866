//! Orchestrator - route, answer, normalize, gate, fall back.

use copilot_shared::{FinalResult, Result};
use tracing::{debug, info};

use crate::gate::ConfidenceGate;
use crate::responders::ResponderSet;
use crate::router;

/// Composes the router, the injected responders and the confidence gate.
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Clone)]
pub struct Orchestrator {
    responders: ResponderSet,
    gate: ConfidenceGate,
}

impl Orchestrator {
    pub fn new(responders: ResponderSet, gate: ConfidenceGate) -> Self {
        Self { responders, gate }
    }

    /// Answer one question.
    ///
    /// Low-confidence results are replaced by the clarifier. Collaborator
    /// failures are returned as errors; they never trigger the clarifier.
    pub fn run(&self, question: &str) -> Result<FinalResult> {
        let rule = router::classify(question);
        let kind = rule.responder();
        let responder = self.responders.get(kind);
        debug!("Routed by {:?} to {}", rule, kind);

        let result = responder.answer(question)?.normalize();

        match self.gate.evaluate(question, &result) {
            Some(reason) => {
                info!(
                    responder = responder.name(),
                    evidence = result.evidence.len(),
                    "Low confidence ({}), falling back to clarifier",
                    reason
                );
                let clarifier = self.responders.clarifier();
                let clarified = clarifier.answer(question)?.normalize();
                Ok(FinalResult::new(clarifier.name(), clarified))
            }
            None => {
                info!(
                    responder = responder.name(),
                    evidence = result.evidence.len(),
                    "Answer accepted"
                );
                Ok(FinalResult::new(responder.name(), result))
            }
        }
    }
}
