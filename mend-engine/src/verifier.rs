//! Verifier: runs the caller-supplied oracle sequence, in order, and
//! concatenates their violation lists. No retries, no suppression.

use mend_core::traits::Oracle;
use mend_core::types::violation::Violation;

/// Aggregated result of one verification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// All violations, per-oracle internal order preserved, concatenated
    /// in the supplied oracle order.
    pub violations: Vec<Violation>,
    /// Identifiers of oracles that reported at least one violation, in
    /// supplied order.
    pub failed_oracles: Vec<String>,
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs a fixed ordered oracle sequence against artifacts.
pub struct Verifier<'a, A> {
    oracles: &'a [Box<dyn Oracle<A>>],
}

impl<'a, A> Verifier<'a, A> {
    pub fn new(oracles: &'a [Box<dyn Oracle<A>>]) -> Self {
        Verifier { oracles }
    }

    pub fn run(&self, artifact: &A) -> Verdict {
        let mut violations = Vec::new();
        let mut failed_oracles = Vec::new();
        for oracle in self.oracles {
            let found = oracle.check(artifact);
            if !found.is_empty() {
                failed_oracles.push(oracle.id().to_string());
                violations.extend(found);
            }
        }
        Verdict {
            violations,
            failed_oracles,
        }
    }
}
