//! Trait seams between the engine and its collaborators.
//!
//! The engine is generic over the artifact type `A` and never inspects it:
//! oracles judge it, the executor rewrites it, the proposer sees it once.
//! Implementations live in the domain and storage crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ExecutorError, ProposerError};
use crate::types::constraint::{Assignment, Constraint};
use crate::types::patch::{Patch, PatchTemplate};
use crate::types::signature::Signature;
use crate::types::space::HoleSpace;
use crate::types::violation::Violation;

/// A declarative check over an artifact.
///
/// Contract: deterministic (same artifact, same violation list in the same
/// order), total (internal failures become a violation with the
/// `oracle.internal` code and empty evidence, never a panic or error), and
/// evidence-honest (claimed forbid hints hold for every matching artifact).
pub trait Oracle<A> {
    /// Stable identifier, used in signatures and reports.
    fn id(&self) -> &str;

    /// Check the artifact. Empty list means compliant.
    fn check(&self, artifact: &A) -> Vec<Violation>;
}

/// Applies a concrete patch to an artifact, producing a new artifact.
pub trait PatchExecutor<A> {
    fn apply(&self, artifact: &A, patch: &Patch) -> Result<A, ExecutorError>;
}

/// A template plus the hole space it enumerates over — the proposer's
/// transport shape, also what the fallback catalog hands the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBundle {
    pub template: PatchTemplate,
    pub hole_space: HoleSpace,
}

impl TemplateBundle {
    pub fn new(template: PatchTemplate, hole_space: HoleSpace) -> Self {
        TemplateBundle { template, hole_space }
    }

    /// Template holes with no domain in the bundled hole space.
    pub fn missing_holes(&self) -> Vec<String> {
        self.template
            .holes()
            .into_iter()
            .filter(|h| !self.hole_space.contains(h))
            .map(str::to_string)
            .collect()
    }

    /// Transport-contract validation: every template hole must be covered.
    pub fn validate(&self) -> Result<(), ProposerError> {
        let missing = self.missing_holes();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProposerError::Malformed {
                reason: format!("template holes missing from hole_space: {}", missing.join(", ")),
            })
        }
    }
}

/// The one-shot remote template source, consulted on a bank miss.
pub trait TemplateProposer<A> {
    fn propose(&self, artifact: &A, violations: &[Violation]) -> Result<TemplateBundle, ProposerError>;
}

/// Domain-supplied default templates, the fallback when both the bank and
/// the proposer come up empty.
pub trait FallbackTemplates {
    fn fallback(&self, violations: &[Violation]) -> TemplateBundle;
}

/// What a bank hit hands the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct BankHit {
    pub template: PatchTemplate,
    pub hole_space: HoleSpace,
    pub constraints: Vec<Constraint>,
}

/// The controller's view of the repair bank.
///
/// Implemented by the persistent bank in `mend-storage`; the controller
/// only ever looks up before synthesis and records after success.
pub trait RepairMemory {
    /// Exact-signature lookup.
    fn lookup(&self, signature: &Signature) -> Option<BankHit>;

    /// Record a successful repair under `signature`: insert a fresh entry
    /// or merge into the existing one.
    #[allow(clippy::too_many_arguments)]
    fn record_success(
        &mut self,
        signature: &Signature,
        template: &PatchTemplate,
        hole_space: &HoleSpace,
        constraints: &[Constraint],
        assignment: &Assignment,
        candidates_tried: u64,
        now: DateTime<Utc>,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::patch::{ArgValue, Operation};
    use crate::types::value::Value;

    #[test]
    fn bundle_validation_catches_uncovered_holes() {
        let template = PatchTemplate::new(vec![
            Operation::new("ensure_label").arg("env", ArgValue::hole("x")),
        ]);
        let space = HoleSpace::from_pairs([("env".to_string(), vec![Value::Str("prod".into())])]).unwrap();
        let bundle = TemplateBundle::new(template, space);
        assert_eq!(bundle.missing_holes(), vec!["x"]);
        assert!(bundle.validate().is_err());
    }
}
