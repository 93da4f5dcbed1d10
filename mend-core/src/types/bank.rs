//! Repair bank entries: one memoised repair pattern per signature.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::constraint::{Assignment, Constraint};
use super::patch::PatchTemplate;
use super::signature::Signature;
use super::space::HoleSpace;

/// Usage statistics for a bank entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    pub success_count: u64,
    pub first_used: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    /// Cumulative candidates tried across all successful attempts.
    pub candidates_tried: u64,
}

/// One memoised repair pattern.
///
/// The template and hole space are frozen at first store; later successes
/// merge constraints and refresh the assignment and statistics. Unknown
/// document fields are kept so foreign annotations survive a round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    pub signature: Signature,
    pub template: PatchTemplate,
    pub hole_space: HoleSpace,
    pub learned_constraints: Vec<Constraint>,
    pub successful_assignment: Assignment,
    pub metadata: EntryStats,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
