//! Learned constraints over hole assignments.
//!
//! Constraints only ever forbid: a single hole value, or a joint tuple of
//! hole values. Tuples are canonicalised at construction (pairs sorted
//! jointly by hole name) so structural equality doubles as semantic
//! equality for deduplication.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A complete choice of one value per hole.
pub type Assignment = BTreeMap<String, Value>;

/// A predicate forbidding some assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Constraint {
    /// Forbids any assignment with `assignment[hole] == value`.
    ForbiddenValue { hole: String, value: Value },
    /// Forbids any assignment matching every `(holes[i], values[i])` pair.
    /// Always at least two pairs, holes distinct, sorted by hole name.
    ForbiddenTuple { holes: Vec<String>, values: Vec<Value> },
}

impl Constraint {
    pub fn forbidden_value(hole: impl Into<String>, value: impl Into<Value>) -> Self {
        Constraint::ForbiddenValue {
            hole: hole.into(),
            value: value.into(),
        }
    }

    /// Build a canonical tuple constraint from hole/value pairs.
    ///
    /// Returns `None` for malformed input: fewer than two pairs, or a
    /// repeated hole name. Callers treat that as evidence to discard, not
    /// an error to surface.
    pub fn forbidden_tuple(pairs: Vec<(String, Value)>) -> Option<Self> {
        if pairs.len() < 2 {
            return None;
        }
        let mut pairs = pairs;
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return None;
        }
        let (holes, values) = pairs.into_iter().unzip();
        Some(Constraint::ForbiddenTuple { holes, values })
    }

    /// Whether `assignment` is forbidden by this constraint.
    pub fn violates(&self, assignment: &Assignment) -> bool {
        match self {
            Constraint::ForbiddenValue { hole, value } => {
                assignment.get(hole) == Some(value)
            }
            Constraint::ForbiddenTuple { holes, values } => holes
                .iter()
                .zip(values)
                .all(|(hole, value)| assignment.get(hole) == Some(value)),
        }
    }

    /// Hole names this constraint mentions.
    pub fn holes(&self) -> impl Iterator<Item = &str> {
        match self {
            Constraint::ForbiddenValue { hole, .. } => std::slice::from_ref(hole).iter(),
            Constraint::ForbiddenTuple { holes, .. } => holes.iter(),
        }
        .map(String::as_str)
    }
}
