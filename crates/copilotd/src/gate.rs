//! Confidence gate - decides whether a responder result can be returned as is.
//!
//! Checks run in order and the first failure rejects the result:
//!
//! 1. no evidence
//! 2. score floor (skipped for VPN failure questions)
//! 3. explicit "not found in knowledge base" marker in the answer
//! 4. topic guard on the top-ranked source
//! 5. token overlap between question and evidence excerpts
//!
//! VPN failure questions are retrieved through a fixed canonical query, so for
//! them only checks 1 and 3 apply.

use copilot_shared::{max_score, ResponderResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::{GateConfig, TopicGuard};
use crate::router::is_vpn_failure;

/// Domain-generic words that say nothing about the topic
pub const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "company", "could", "does", "doing", "explain",
    "from", "give", "guide", "have", "help", "here", "how", "into", "know", "like", "need",
    "please", "policy", "policies", "procedure", "process", "should", "show", "some", "step",
    "steps", "tell", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "what", "when", "where", "which", "while", "with", "would", "your",
];

/// Why a result was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LowConfidenceReason {
    NoEvidence,
    ScoreBelowFloor { max_score: f64, min_score: f64 },
    MissMarker,
    TopicMismatch { source_id: String },
    NoTokenOverlap,
}

impl fmt::Display for LowConfidenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvidence => write!(f, "no evidence"),
            Self::ScoreBelowFloor { max_score, min_score } => {
                write!(f, "max score {:.3} below floor {:.3}", max_score, min_score)
            }
            Self::MissMarker => write!(f, "answer reports a knowledge-base miss"),
            Self::TopicMismatch { source_id } => {
                write!(f, "question off-topic for source {}", source_id)
            }
            Self::NoTokenOverlap => write!(f, "no question token found in evidence"),
        }
    }
}

/// Configured gate; immutable and shareable across requests
#[derive(Debug, Clone)]
pub struct ConfidenceGate {
    min_score: f64,
    miss_marker: String,
    topic_guards: Vec<TopicGuard>,
    stopwords: HashSet<String>,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

impl ConfidenceGate {
    pub fn from_config(config: &GateConfig) -> Self {
        let stopwords = STOPWORDS
            .iter()
            .map(|s| s.to_string())
            .chain(config.extra_stopwords.iter().map(|s| s.to_lowercase()))
            .collect();

        Self {
            min_score: config.min_score,
            miss_marker: config.miss_marker.to_lowercase(),
            topic_guards: config
                .topic_guards
                .iter()
                .map(|g| TopicGuard {
                    source_pattern: g.source_pattern.to_lowercase(),
                    required_any: g.required_any.iter().map(|k| k.to_lowercase()).collect(),
                })
                .collect(),
            stopwords,
        }
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn is_low_confidence(&self, question: &str, result: &ResponderResult) -> bool {
        self.evaluate(question, result).is_some()
    }

    /// First failing check, or `None` when the result is accepted
    pub fn evaluate(&self, question: &str, result: &ResponderResult) -> Option<LowConfidenceReason> {
        let Some(top) = result.evidence.first() else {
            return Some(LowConfidenceReason::NoEvidence);
        };

        let q = question.to_lowercase();
        let vpn_failure = is_vpn_failure(&q);

        if !vpn_failure {
            let best = max_score(&result.evidence);
            if best < self.min_score {
                return Some(LowConfidenceReason::ScoreBelowFloor {
                    max_score: best,
                    min_score: self.min_score,
                });
            }
        }

        if result.text.to_lowercase().contains(&self.miss_marker) {
            return Some(LowConfidenceReason::MissMarker);
        }

        if vpn_failure {
            return None;
        }

        if let Some(guard) = self.topic_guard_for(&top.source_id) {
            if !guard.required_any.iter().any(|k| q.contains(k.as_str())) {
                return Some(LowConfidenceReason::TopicMismatch {
                    source_id: top.source_id.clone(),
                });
            }
        }

        let tokens = self.content_tokens(question);
        if !tokens.is_empty() {
            let blob = result
                .evidence
                .iter()
                .map(|e| e.excerpt.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            if !tokens.iter().any(|t| blob.contains(t.as_str())) {
                return Some(LowConfidenceReason::NoTokenOverlap);
            }
        }

        None
    }

    /// First guard whose pattern occurs in the source id
    pub fn topic_guard_for(&self, source_id: &str) -> Option<&TopicGuard> {
        let source = source_id.to_lowercase();
        self.topic_guards
            .iter()
            .find(|g| source.contains(g.source_pattern.as_str()))
    }

    /// Topic-bearing question tokens: longer than three characters and not stopwords
    pub fn content_tokens(&self, question: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        question
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.chars().count() > 3)
            .filter(|w| !self.stopwords.contains(w))
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_shared::EvidenceItem;

    fn result(text: &str, evidence: Vec<EvidenceItem>) -> ResponderResult {
        ResponderResult {
            text: text.to_string(),
            evidence,
        }
    }

    fn item(source: &str, score: Option<f64>, excerpt: &str) -> EvidenceItem {
        EvidenceItem::new(source, score, excerpt)
    }

    #[test]
    fn test_no_evidence_rejected() {
        let gate = ConfidenceGate::default();
        for q in ["", "vpn failed", "what is the leave policy", "anything at all"] {
            assert_eq!(
                gate.evaluate(q, &result("Summary: fine", vec![])),
                Some(LowConfidenceReason::NoEvidence)
            );
        }
    }

    #[test]
    fn test_score_floor() {
        let gate = ConfidenceGate::default().with_min_score(0.20);
        let q = "how do I configure printer duplex";

        let low = result("Summary: duplex", vec![item("x.txt", Some(0.10), "printer duplex settings")]);
        assert!(matches!(
            gate.evaluate(q, &low),
            Some(LowConfidenceReason::ScoreBelowFloor { .. })
        ));

        let ok = result("Summary: duplex", vec![item("x.txt", Some(0.25), "printer duplex settings")]);
        assert!(!gate.is_low_confidence(q, &ok));
    }

    #[test]
    fn test_missing_scores_count_as_zero() {
        let gate = ConfidenceGate::default();
        let r = result("text", vec![item("x.txt", None, "printer duplex")]);
        assert!(gate.is_low_confidence("printer duplex", &r));
    }

    #[test]
    fn test_max_score_not_first_item() {
        let gate = ConfidenceGate::default();
        let r = result(
            "text",
            vec![item("a.txt", None, "printer"), item("b.txt", Some(0.4), "duplex")],
        );
        assert!(!gate.is_low_confidence("printer duplex", &r));
    }

    #[test]
    fn test_vpn_failure_skips_score_floor() {
        let gate = ConfidenceGate::default();
        let r = result(
            "Summary: restart the client",
            vec![item("vpn_troubleshooting.txt", Some(0.01), "restart the client")],
        );
        assert!(!gate.is_low_confidence("vpn not connecting since morning", &r));
    }

    #[test]
    fn test_vpn_failure_still_honours_miss_marker() {
        let gate = ConfidenceGate::default();
        let r = result(
            "Not found in knowledge base. Which VPN client?",
            vec![item("vpn_troubleshooting.txt", Some(0.9), "restart the client")],
        );
        assert_eq!(
            gate.evaluate("vpn failed after update", &r),
            Some(LowConfidenceReason::MissMarker)
        );
    }

    #[test]
    fn test_miss_marker_case_insensitive() {
        let gate = ConfidenceGate::default();
        let r = result(
            "NOT FOUND IN KNOWLEDGE BASE",
            vec![item("printer.txt", Some(0.9), "printer duplex")],
        );
        assert!(gate.is_low_confidence("printer duplex", &r));
    }

    #[test]
    fn test_hr_strict_guard_rejects_maternity() {
        let gate = ConfidenceGate::default();
        let r = result(
            "Summary: 25 days of annual leave",
            vec![item(
                "hr_leave_policy.txt",
                Some(0.9),
                "Annual leave entitlement is 25 days, booked in Workday.",
            )],
        );
        assert_eq!(
            gate.evaluate("what is maternity leave policy", &r),
            Some(LowConfidenceReason::TopicMismatch {
                source_id: "hr_leave_policy.txt".to_string()
            })
        );
    }

    #[test]
    fn test_hr_strict_guard_accepts_annual_leave() {
        let gate = ConfidenceGate::default();
        let r = result(
            "Summary: 25 days",
            vec![item(
                "hr_leave_policy.txt",
                Some(0.9),
                "Annual leave entitlement is 25 days, booked in Workday.",
            )],
        );
        assert!(!gate.is_low_confidence("how many days of annual leave do I get", &r));
    }

    #[test]
    fn test_topic_guard_uses_top_item_only() {
        let gate = ConfidenceGate::default();
        let r = result(
            "text",
            vec![
                item("printer_guide.txt", Some(0.8), "printer queue"),
                item("vpn_setup.txt", Some(0.7), "vpn profile"),
            ],
        );
        // No guard for the printer source, so the vpn guard below it is irrelevant
        assert!(!gate.is_low_confidence("printer queue stuck", &r));
    }

    #[test]
    fn test_wifi_guard() {
        let gate = ConfidenceGate::default();
        let r = result(
            "text",
            vec![item("wifi_troubleshooting.md", Some(0.8), "forget the network and rejoin")],
        );
        assert!(gate.is_low_confidence("how do I rejoin the network", &r));
        assert!(!gate.is_low_confidence("wireless network rejoin", &r));
    }

    #[test]
    fn test_token_overlap_rejects_unrelated_excerpt() {
        let gate = ConfidenceGate::default();
        let r = result(
            "Summary: change your password",
            vec![item(
                "password_reset.txt",
                Some(0.9),
                "To change a forgotten password, open the self-service portal and choose Forgot Password.",
            )],
        );
        assert_eq!(
            gate.evaluate("how do I reset my desk phone extension", &r),
            Some(LowConfidenceReason::NoTokenOverlap)
        );
    }

    #[test]
    fn test_token_overlap_matches_substring() {
        let gate = ConfidenceGate::default();
        let r = result(
            "text",
            vec![item("printing.txt", Some(0.9), "Printers are mapped at login.")],
        );
        assert!(!gate.is_low_confidence("printer mapping?", &r));
    }

    #[test]
    fn test_only_short_or_stopword_tokens_pass_overlap() {
        let gate = ConfidenceGate::default();
        let r = result("text", vec![item("misc.txt", Some(0.9), "unrelated text")]);
        assert!(!gate.is_low_confidence("what is the company policy?", &r));
    }

    #[test]
    fn test_content_tokens() {
        let gate = ConfidenceGate::default();
        assert_eq!(
            gate.content_tokens("How do I reset my (desk) phone, please? Phone!"),
            vec!["reset", "desk", "phone"]
        );
    }

    #[test]
    fn test_extra_stopwords_from_config() {
        let config = GateConfig {
            extra_stopwords: vec!["Printer".to_string()],
            ..GateConfig::default()
        };
        let gate = ConfidenceGate::from_config(&config);
        assert!(gate.content_tokens("printer duplex").contains(&"duplex".to_string()));
        assert!(!gate.content_tokens("printer duplex").contains(&"printer".to_string()));
    }

    #[test]
    fn test_reason_display() {
        let reason = LowConfidenceReason::ScoreBelowFloor {
            max_score: 0.1,
            min_score: 0.2,
        };
        assert_eq!(reason.to_string(), "max score 0.100 below floor 0.200");
    }
}
