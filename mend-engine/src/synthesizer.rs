//! Synthesizer: one full CEGIS attempt.
//!
//! Verify the artifact, learn constraints from the violations, enumerate
//! candidate assignments, instantiate and apply the template, verify again,
//! learn again — until the artifact passes, the space is exhausted, or a
//! budget runs out. Every patch is applied to the *original* artifact:
//! patches are not idempotent across assignments, and stacking them would
//! confuse oracle evidence.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use mend_core::errors::EngineError;
use mend_core::traits::PatchExecutor;
use mend_core::types::constraint::{Assignment, Constraint};
use mend_core::types::patch::PatchTemplate;
use mend_core::types::space::HoleSpace;

use crate::enumerator::CandidateEnumerator;
use crate::extractor;
use crate::instantiate::instantiate;
use crate::verifier::Verifier;

/// Budgets bounding one synthesis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    /// Maximum candidates tried.
    pub max_candidates: u64,
    /// Maximum consecutive iterations that learn no new constraint.
    pub max_iters: u64,
    /// Wall-clock deadline, checked between candidates, never mid-candidate.
    pub timeout: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Budgets {
            max_candidates: 512,
            max_iters: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Terminal result of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisVerdict<A> {
    /// Every oracle returned an empty violation list for `artifact`.
    /// The assignment is empty when the input was already compliant.
    Success { artifact: A, assignment: Assignment },
    /// Enumeration exhausted without a satisfying assignment.
    Unsat,
    /// `max_candidates` reached.
    BudgetExhausted,
    /// Wall-clock deadline reached.
    Timeout,
    /// `max_iters` consecutive iterations learned no new constraint.
    NoProgress,
}

/// One attempt's outcome: the verdict plus counters and everything learned,
/// whichever branch fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis<A> {
    pub verdict: SynthesisVerdict<A>,
    /// Full constraint list at termination: initial plus learned.
    pub constraints: Vec<Constraint>,
    /// Verify-and-learn rounds completed on candidate artifacts.
    pub iterations: u64,
    /// Candidates instantiated and handed to the executor.
    pub candidates_tried: u64,
    /// Candidates the executor rejected. Informational; never terminal.
    pub apply_failures: u64,
}

impl<A> Synthesis<A> {
    pub fn succeeded(&self) -> bool {
        matches!(self.verdict, SynthesisVerdict::Success { .. })
    }
}

/// Executor of one CEGIS attempt. Deterministic in its inputs; the only
/// clock dependence is the timeout branch.
pub struct Synthesizer<'a, A> {
    verifier: Verifier<'a, A>,
    executor: &'a dyn PatchExecutor<A>,
}

impl<'a, A: Clone> Synthesizer<'a, A> {
    pub fn new(verifier: Verifier<'a, A>, executor: &'a dyn PatchExecutor<A>) -> Self {
        Synthesizer { verifier, executor }
    }

    pub fn run(
        &self,
        artifact: &A,
        template: &PatchTemplate,
        space: &HoleSpace,
        initial_constraints: &[Constraint],
        budgets: &Budgets,
    ) -> Result<Synthesis<A>, EngineError> {
        // Every referenced hole needs a domain before enumeration begins.
        for hole in template.holes() {
            if !space.contains(hole) {
                return Err(EngineError::UnboundHole { hole: hole.to_string() });
            }
        }

        let started = Instant::now();
        let mut constraints: Vec<Constraint> = Vec::new();
        for c in initial_constraints {
            push_new(&mut constraints, c.clone());
        }

        let initial = self.verifier.run(artifact);
        if initial.is_clean() {
            info!(candidates = 0, "artifact already compliant, vacuous success");
            return Ok(Synthesis {
                verdict: SynthesisVerdict::Success {
                    artifact: artifact.clone(),
                    assignment: Assignment::new(),
                },
                constraints,
                iterations: 0,
                candidates_tried: 0,
                apply_failures: 0,
            });
        }

        for c in extractor::extract(&initial.violations, space) {
            push_new(&mut constraints, c);
        }

        let mut enumerator = CandidateEnumerator::new(space, constraints.clone());
        let mut candidates_tried: u64 = 0;
        let mut iterations: u64 = 0;
        let mut apply_failures: u64 = 0;
        let mut stale_iterations: u64 = 0;

        loop {
            if candidates_tried >= budgets.max_candidates {
                info!(candidates_tried, "candidate budget exhausted");
                return Ok(self.finish(
                    SynthesisVerdict::BudgetExhausted,
                    constraints,
                    iterations,
                    candidates_tried,
                    apply_failures,
                ));
            }
            if started.elapsed() >= budgets.timeout {
                info!(candidates_tried, "deadline reached");
                return Ok(self.finish(
                    SynthesisVerdict::Timeout,
                    constraints,
                    iterations,
                    candidates_tried,
                    apply_failures,
                ));
            }
            let Some(assignment) = enumerator.next() else {
                info!(candidates_tried, pruned = enumerator.stats().pruned, "space exhausted");
                return Ok(self.finish(
                    SynthesisVerdict::Unsat,
                    constraints,
                    iterations,
                    candidates_tried,
                    apply_failures,
                ));
            };

            let patch = instantiate(template, &assignment)?;
            candidates_tried += 1;

            let patched = match self.executor.apply(artifact, &patch) {
                Ok(patched) => patched,
                Err(e) => {
                    debug!(error = %e, ?assignment, "patch application failed, skipping candidate");
                    apply_failures += 1;
                    continue;
                }
            };

            let verdict = self.verifier.run(&patched);
            if verdict.is_clean() {
                info!(candidates_tried, iterations, "repair found");
                return Ok(Synthesis {
                    verdict: SynthesisVerdict::Success {
                        artifact: patched,
                        assignment,
                    },
                    constraints,
                    iterations,
                    candidates_tried,
                    apply_failures,
                });
            }

            iterations += 1;
            let mut learned_any = false;
            for c in extractor::extract(&verdict.violations, space) {
                if !constraints.contains(&c) {
                    enumerator.add_constraint(c.clone());
                    constraints.push(c);
                    learned_any = true;
                }
            }
            debug!(
                candidates_tried,
                violations = verdict.violations.len(),
                learned_any,
                "candidate rejected"
            );
            if learned_any {
                stale_iterations = 0;
            } else {
                stale_iterations += 1;
                if stale_iterations >= budgets.max_iters {
                    info!(iterations, "no progress across {} iterations", stale_iterations);
                    return Ok(self.finish(
                        SynthesisVerdict::NoProgress,
                        constraints,
                        iterations,
                        candidates_tried,
                        apply_failures,
                    ));
                }
            }
        }
    }

    fn finish(
        &self,
        verdict: SynthesisVerdict<A>,
        constraints: Vec<Constraint>,
        iterations: u64,
        candidates_tried: u64,
        apply_failures: u64,
    ) -> Synthesis<A> {
        Synthesis {
            verdict,
            constraints,
            iterations,
            candidates_tried,
            apply_failures,
        }
    }
}

fn push_new(constraints: &mut Vec<Constraint>, constraint: Constraint) {
    if !constraints.contains(&constraint) {
        constraints.push(constraint);
    }
}
