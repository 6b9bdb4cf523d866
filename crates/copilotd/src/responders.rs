//! The four responders.
//!
//! All of them are stateless and are built once at startup, then shared by
//! `Arc` across requests.

use copilot_shared::{RawAnswer, Result};
use std::sync::Arc;
use tracing::debug;

use crate::rag::KnowledgeService;
use crate::router::{contains_any, is_vpn_failure, ResponderKind};

/// Canonical query for VPN connection failures
pub const VPN_CANONICAL_QUERY: &str = "vpn not connecting troubleshooting steps";

/// Canonical query for wifi problems
pub const WIFI_CANONICAL_QUERY: &str = "wifi troubleshooting steps";

const WIFI_TERMS: &[&str] = &["wifi", "wi-fi", "wireless"];

/// Substring HR terms; "hr" itself is matched as a whole word
const HR_TERMS: &[&str] = &["leave", "holiday", "annual", "vacation"];

pub const KB_TOP_K: usize = 2;
pub const TROUBLESHOOTING_TOP_K: usize = 2;
pub const TICKET_TOP_K: usize = 3;

/// A strategy producing an answer plus raw supporting evidence
pub trait Responder: Send + Sync {
    fn kind(&self) -> ResponderKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn answer(&self, question: &str) -> Result<RawAnswer>;
}

/// Answers straight from the knowledge base
pub struct KbAnswerResponder {
    service: Arc<dyn KnowledgeService>,
}

impl KbAnswerResponder {
    pub fn new(service: Arc<dyn KnowledgeService>) -> Self {
        Self { service }
    }
}

impl Responder for KbAnswerResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::KbAnswer
    }

    fn answer(&self, question: &str) -> Result<RawAnswer> {
        self.service.ask(question, KB_TOP_K)
    }
}

/// Rewrites incident questions into short intent-only queries first
pub struct TroubleshootingResponder {
    service: Arc<dyn KnowledgeService>,
}

impl TroubleshootingResponder {
    pub fn new(service: Arc<dyn KnowledgeService>) -> Self {
        Self { service }
    }
}

/// Retrieval query for a troubleshooting question: canonical for VPN and wifi, else unchanged
pub fn canonical_query(question: &str) -> String {
    let q = question.to_lowercase();

    if is_vpn_failure(&q) {
        return VPN_CANONICAL_QUERY.to_string();
    }

    if contains_any(&q, WIFI_TERMS) {
        return WIFI_CANONICAL_QUERY.to_string();
    }

    question.to_string()
}

impl Responder for TroubleshootingResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::Troubleshooting
    }

    fn answer(&self, question: &str) -> Result<RawAnswer> {
        let query = canonical_query(question);
        debug!("Troubleshooting query: {:?}", query);
        self.service.ask(&query, TROUBLESHOOTING_TOP_K)
    }
}

/// Drafts an ITSM ticket grounded in retrieved context
pub struct TicketWriterResponder {
    service: Arc<dyn KnowledgeService>,
}

impl TicketWriterResponder {
    pub fn new(service: Arc<dyn KnowledgeService>) -> Self {
        Self { service }
    }
}

pub fn ticket_prompt(question: &str) -> String {
    format!(
        "Create an ITSM ticket summary using ONLY retrieved context.\n\
         If context is missing, state what is missing.\n\n\
         Format exactly:\n\
         Title:\n\
         Impact:\n\
         Symptoms:\n\
         Likely Cause:\n\
         Suggested Next Steps:\n\
         References:\n\n\
         User request: {}",
        question
    )
}

impl Responder for TicketWriterResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::TicketWriter
    }

    fn answer(&self, question: &str) -> Result<RawAnswer> {
        self.service.ask(&ticket_prompt(question), TICKET_TOP_K)
    }
}

/// Asks for more detail; never retrieves, never returns evidence
pub struct ClarifierResponder;

pub const HR_CLARIFICATION: &str = "I don't have HR policy details for that in my knowledge base yet.\n\
     Do you use a specific HR system (e.g., Workday, BambooHR), \
     or would you like to upload the relevant policy document?";

pub const GENERIC_CLARIFICATION: &str = "I don't have enough information to answer accurately.\n\
     Could you clarify the system, environment (prod/dev), or the exact error message you are seeing?";

fn mentions_hr(q: &str) -> bool {
    contains_any(q, HR_TERMS)
        || q.split(|c: char| !c.is_alphanumeric())
            .any(|w| w == "hr")
}

impl ClarifierResponder {
    pub fn clarification(question: &str) -> &'static str {
        if mentions_hr(&question.to_lowercase()) {
            HR_CLARIFICATION
        } else {
            GENERIC_CLARIFICATION
        }
    }
}

impl Responder for ClarifierResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::Clarifier
    }

    fn answer(&self, question: &str) -> Result<RawAnswer> {
        Ok(RawAnswer::text_only(Self::clarification(question)))
    }
}

/// The injected set of responders, one per kind
#[derive(Clone)]
pub struct ResponderSet {
    kb_answer: Arc<dyn Responder>,
    troubleshooting: Arc<dyn Responder>,
    ticket_writer: Arc<dyn Responder>,
    clarifier: Arc<dyn Responder>,
}

impl ResponderSet {
    pub fn new(
        kb_answer: Arc<dyn Responder>,
        troubleshooting: Arc<dyn Responder>,
        ticket_writer: Arc<dyn Responder>,
        clarifier: Arc<dyn Responder>,
    ) -> Self {
        Self {
            kb_answer,
            troubleshooting,
            ticket_writer,
            clarifier,
        }
    }

    /// Standard set: three retrieving responders over one service plus the clarifier
    pub fn with_service(service: Arc<dyn KnowledgeService>) -> Self {
        Self::new(
            Arc::new(KbAnswerResponder::new(service.clone())),
            Arc::new(TroubleshootingResponder::new(service.clone())),
            Arc::new(TicketWriterResponder::new(service)),
            Arc::new(ClarifierResponder),
        )
    }

    pub fn get(&self, kind: ResponderKind) -> &dyn Responder {
        match kind {
            ResponderKind::KbAnswer => self.kb_answer.as_ref(),
            ResponderKind::Troubleshooting => self.troubleshooting.as_ref(),
            ResponderKind::TicketWriter => self.ticket_writer.as_ref(),
            ResponderKind::Clarifier => self.clarifier.as_ref(),
        }
    }

    pub fn clarifier(&self) -> &dyn Responder {
        self.clarifier.as_ref()
    }
}
