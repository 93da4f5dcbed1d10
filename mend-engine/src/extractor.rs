//! Constraint extractor: violation evidence → deduplicated constraints.
//!
//! The extractor never invents constraints beyond what evidence explicitly
//! asserts, and evidence naming holes outside the current hole space is
//! discarded — such a violation cannot be addressed by this template.

use mend_core::types::constraint::Constraint;
use mend_core::types::space::HoleSpace;
use mend_core::types::violation::Violation;

/// Extract constraints from a violation list, deduplicated in first-seen
/// order.
pub fn extract(violations: &[Violation], space: &HoleSpace) -> Vec<Constraint> {
    let mut out: Vec<Constraint> = Vec::new();
    for violation in violations {
        for hv in &violation.evidence.forbid_value {
            if !space.contains(&hv.hole) {
                continue;
            }
            push_unique(
                &mut out,
                Constraint::forbidden_value(hv.hole.clone(), hv.value.clone()),
            );
        }
        for tuple in &violation.evidence.forbid_tuple {
            if tuple.iter().any(|hv| !space.contains(&hv.hole)) {
                continue;
            }
            let pairs = tuple
                .iter()
                .map(|hv| (hv.hole.clone(), hv.value.clone()))
                .collect();
            // Malformed tuples (k < 2, repeated holes) come back as None
            // and are dropped like out-of-space evidence.
            if let Some(constraint) = Constraint::forbidden_tuple(pairs) {
                push_unique(&mut out, constraint);
            }
        }
    }
    out
}

fn push_unique(out: &mut Vec<Constraint>, constraint: Constraint) {
    if !out.contains(&constraint) {
        out.push(constraint);
    }
}
