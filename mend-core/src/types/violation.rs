//! Oracle violations and their machine-readable evidence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Error code oracles use when their own machinery fails. Carries empty
/// evidence: an internal failure says nothing about hole values.
pub const ORACLE_INTERNAL: &str = "oracle.internal";

/// One hole/value pair inside evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleValue {
    pub hole: String,
    pub value: Value,
}

impl HoleValue {
    pub fn new(hole: impl Into<String>, value: impl Into<Value>) -> Self {
        HoleValue {
            hole: hole.into(),
            value: value.into(),
        }
    }
}

/// Constraint hints attached to a violation.
///
/// The two recognised fields map directly onto the constraint kinds; any
/// other key an oracle emits is preserved round-trip but ignored by the
/// extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbid_value: Vec<HoleValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbid_tuple: Vec<Vec<HoleValue>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Evidence {
    pub fn none() -> Self {
        Evidence::default()
    }

    pub fn is_empty(&self) -> bool {
        self.forbid_value.is_empty() && self.forbid_tuple.is_empty() && self.extra.is_empty()
    }

    pub fn with_forbid_value(mut self, hole: impl Into<String>, value: impl Into<Value>) -> Self {
        self.forbid_value.push(HoleValue::new(hole, value));
        self
    }

    pub fn with_forbid_tuple(mut self, pairs: Vec<HoleValue>) -> Self {
        self.forbid_tuple.push(pairs);
        self
    }
}

/// A single oracle failure: stable error code, human message, evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Evidence::is_empty")]
    pub evidence: Evidence,
}

impl Violation {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            code: code.into(),
            message: message.into(),
            evidence: Evidence::none(),
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    /// The distinguished violation an oracle reports when it fails
    /// internally rather than observing a real policy breach.
    pub fn internal(oracle_id: &str, message: impl Into<String>) -> Self {
        Violation::new(ORACLE_INTERNAL, format!("{}: {}", oracle_id, message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_evidence_keys_round_trip() {
        let text = r#"{
            "code": "policy.replicas.window",
            "message": "too few replicas",
            "evidence": {
                "forbid_value": [{"hole": "replicas", "value": 2}],
                "hint": "scale up"
            }
        }"#;
        let v: Violation = serde_json::from_str(text).unwrap();
        assert_eq!(v.evidence.forbid_value.len(), 1);
        assert_eq!(v.evidence.extra.get("hint").unwrap(), "scale up");

        let back = serde_json::to_string(&v).unwrap();
        let again: Violation = serde_json::from_str(&back).unwrap();
        assert_eq!(again, v);
    }

    #[test]
    fn internal_violation_has_empty_evidence() {
        let v = Violation::internal("replica-policy", "panicked on shape");
        assert_eq!(v.code, ORACLE_INTERNAL);
        assert!(v.evidence.is_empty());
    }
}
