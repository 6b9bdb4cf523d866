//! Evidence items and the normalizer that repairs untrusted retrieval output.
//!
//! Retrieval collaborators hand back loosely shaped JSON. Everything past the
//! normalizer sees only `EvidenceItem`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Source id used when a record carries none.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One unit of supporting material behind an answer.
///
/// Serialized in the caller-facing `{file, score, snippet}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Source identifier (usually a file name)
    #[serde(rename = "file")]
    pub source_id: String,
    /// Relevance score, higher = more relevant; `None` when absent or invalid
    #[serde(rename = "score")]
    pub relevance_score: Option<f64>,
    /// Excerpt of the source text
    #[serde(rename = "snippet", default)]
    pub excerpt: String,
}

impl EvidenceItem {
    pub fn new(source_id: impl Into<String>, relevance_score: Option<f64>, excerpt: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            relevance_score,
            excerpt: excerpt.into(),
        }
    }

    /// Normalize a single raw entry. Non-record entries yield `None`.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = match raw.as_object() {
            Some(record) => record,
            None => {
                debug!("Dropping non-record evidence entry: {}", raw);
                return None;
            }
        };

        let source_id = first_str(record, &["source_id", "file", "file_name", "filename"])
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
            .to_string();

        let relevance_score = first_value(record, &["relevance_score", "score"])
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite());

        let excerpt = first_str(record, &["excerpt", "snippet", "text"])
            .unwrap_or_default()
            .to_string();

        Some(Self {
            source_id,
            relevance_score,
            excerpt,
        })
    }
}

/// Canonicalize raw evidence: drop non-records, default missing fields,
/// keep the original order.
pub fn normalize_evidence(raw: &[Value]) -> Vec<EvidenceItem> {
    raw.iter().filter_map(EvidenceItem::from_raw).collect()
}

/// Highest numeric score across the items, 0.0 when none has one.
pub fn max_score(evidence: &[EvidenceItem]) -> f64 {
    evidence
        .iter()
        .filter_map(|e| e.relevance_score)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))))
        .unwrap_or(0.0)
}

fn first_value<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

fn first_str<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| record.get(*k).and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_record() {
        let item = EvidenceItem::from_raw(&json!({
            "source_id": "vpn_guide.txt",
            "relevance_score": 0.42,
            "excerpt": "Restart the VPN client."
        }))
        .unwrap();

        assert_eq!(item.source_id, "vpn_guide.txt");
        assert_eq!(item.relevance_score, Some(0.42));
        assert_eq!(item.excerpt, "Restart the VPN client.");
    }

    #[test]
    fn test_wire_field_names_accepted() {
        let item = EvidenceItem::from_raw(&json!({
            "file": "wifi.md",
            "score": 0.7,
            "snippet": "Forget the network and rejoin."
        }))
        .unwrap();

        assert_eq!(item.source_id, "wifi.md");
        assert_eq!(item.relevance_score, Some(0.7));
        assert_eq!(item.excerpt, "Forget the network and rejoin.");
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let item = EvidenceItem::from_raw(&json!({})).unwrap();
        assert_eq!(item.source_id, UNKNOWN_SOURCE);
        assert_eq!(item.relevance_score, None);
        assert_eq!(item.excerpt, "");

        let item = EvidenceItem::from_raw(&json!({"file": "   ", "score": "high"})).unwrap();
        assert_eq!(item.source_id, UNKNOWN_SOURCE);
        assert_eq!(item.relevance_score, None);
    }

    #[test]
    fn test_null_score_falls_through_to_alias() {
        let item = EvidenceItem::from_raw(&json!({"relevance_score": null, "score": 0.3})).unwrap();
        assert_eq!(item.relevance_score, Some(0.3));
    }

    #[test]
    fn test_non_records_dropped_order_kept() {
        let raw = vec![
            json!({"file": "a.txt", "score": 0.9, "snippet": "first"}),
            json!("not a record"),
            json!(42),
            json!(null),
            json!({"file": "b.txt", "score": 0.5, "snippet": "second"}),
        ];

        let normalized = normalize_evidence(&raw);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].source_id, "a.txt");
        assert_eq!(normalized[1].source_id, "b.txt");
    }

    #[test]
    fn test_max_score() {
        let evidence = vec![
            EvidenceItem::new("a", Some(0.1), ""),
            EvidenceItem::new("b", None, ""),
            EvidenceItem::new("c", Some(0.35), ""),
        ];
        assert_eq!(max_score(&evidence), 0.35);
        assert_eq!(max_score(&[EvidenceItem::new("a", None, "")]), 0.0);
        assert_eq!(max_score(&[]), 0.0);
    }

    #[test]
    fn test_serializes_null_score() {
        let item = EvidenceItem::new("a.txt", None, "text");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"file": "a.txt", "score": null, "snippet": "text"}));
    }
}
