//! Deterministic router - picks a responder from the question text.
//!
//! Rules are checked top to bottom and the first match wins. Ticket intent
//! outranks troubleshooting intent, which outranks the knowledge-base default,
//! so "vpn ticket failed" becomes a ticket and not a troubleshooting session.

use serde::{Deserialize, Serialize};

/// Ticket / ITSM intent
pub const TICKET_KEYWORDS: &[&str] = &["ticket", "jira", "itsm", "servicenow"];

/// Connection-failure phrasing that turns a VPN mention into an incident
pub const VPN_FAILURE_PHRASES: &[&str] = &[
    "not connecting",
    "can't connect",
    "cannot connect",
    "fails",
    "failed",
    "disconnect",
    "timeout",
    "stuck",
];

/// Generic incident language
pub const INCIDENT_KEYWORDS: &[&str] = &["troubleshoot", "not working", "error", "issue", "problem"];

/// The four responders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    KbAnswer,
    Troubleshooting,
    TicketWriter,
    Clarifier,
}

impl ResponderKind {
    /// Name reported to callers as `agent`
    pub fn name(&self) -> &'static str {
        match self {
            Self::KbAnswer => "kb_answer",
            Self::Troubleshooting => "troubleshooting",
            Self::TicketWriter => "ticket_writer",
            Self::Clarifier => "clarifier",
        }
    }
}

impl std::fmt::Display for ResponderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRule {
    TicketIntent,
    VpnFailure,
    Incident,
    Default,
}

impl RouteRule {
    pub fn responder(&self) -> ResponderKind {
        match self {
            Self::TicketIntent => ResponderKind::TicketWriter,
            Self::VpnFailure | Self::Incident => ResponderKind::Troubleshooting,
            Self::Default => ResponderKind::KbAnswer,
        }
    }
}

/// True when `q` (already lower-cased) mentions the VPN together with a
/// connection-failure phrase. Shared with the confidence gate.
pub fn is_vpn_failure(q: &str) -> bool {
    q.contains("vpn") && contains_any(q, VPN_FAILURE_PHRASES)
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Find the first rule matching the question
pub fn classify(question: &str) -> RouteRule {
    let q = question.to_lowercase();

    if contains_any(&q, TICKET_KEYWORDS) {
        return RouteRule::TicketIntent;
    }

    if is_vpn_failure(&q) {
        return RouteRule::VpnFailure;
    }

    if contains_any(&q, INCIDENT_KEYWORDS) {
        return RouteRule::Incident;
    }

    RouteRule::Default
}

/// Select the responder for a question. Total: never fails.
pub fn select(question: &str) -> ResponderKind {
    classify(question).responder()
}
