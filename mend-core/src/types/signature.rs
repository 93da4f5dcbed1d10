//! Violation signatures: the repair bank's lookup key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;
use super::violation::Violation;

/// A structured fingerprint of a violation situation.
///
/// Two signatures are equal iff the failed-oracle set, the sorted distinct
/// error codes, and the context map are all equal. Construction sorts and
/// deduplicates; derived equality ignores input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub failed_oracles: Vec<String>,
    pub error_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

impl Signature {
    pub fn new(
        failed_oracles: impl IntoIterator<Item = String>,
        error_codes: impl IntoIterator<Item = String>,
        context: BTreeMap<String, Value>,
    ) -> Self {
        let mut failed_oracles: Vec<String> = failed_oracles.into_iter().collect();
        failed_oracles.sort();
        failed_oracles.dedup();
        let mut error_codes: Vec<String> = error_codes.into_iter().collect();
        error_codes.sort();
        error_codes.dedup();
        Signature {
            failed_oracles,
            error_codes,
            context,
        }
    }

    /// Fingerprint a violation list: the oracle identifiers that failed,
    /// the distinct codes they reported, and optional artifact context.
    pub fn from_violations(
        failed_oracles: impl IntoIterator<Item = String>,
        violations: &[Violation],
        context: BTreeMap<String, Value>,
    ) -> Self {
        Signature::new(
            failed_oracles,
            violations.iter().map(|v| v.code.clone()),
            context,
        )
    }
}
