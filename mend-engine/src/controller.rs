//! Controller: orchestrates one repair request end to end.
//!
//! Verify → fingerprint → acquire a template (bank, proposer, or domain
//! default) → synthesize → on success, update the bank. The bank is never
//! mutated on failure.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use mend_core::errors::EngineError;
use mend_core::traits::{
    FallbackTemplates, Oracle, PatchExecutor, RepairMemory, TemplateBundle, TemplateProposer,
};
use mend_core::types::constraint::{Assignment, Constraint};
use mend_core::types::signature::Signature;
use mend_core::types::value::Value;

use crate::synthesizer::{Budgets, Synthesis, SynthesisVerdict, Synthesizer};
use crate::verifier::Verifier;

/// Where the template that drove synthesis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOrigin {
    Bank,
    Proposer,
    Default,
}

/// Terminal status of one repair request.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairStatus<A> {
    /// The input already passed every oracle; nothing was changed.
    NoViolationsInitially,
    /// A repaired artifact was produced and verified.
    Repaired { artifact: A, assignment: Assignment },
    Unsat,
    BudgetExhausted,
    Timeout,
    NoProgress,
    /// The template referenced a hole with no domain; synthesis never
    /// started enumerating.
    UnboundHole { hole: String },
}

impl<A> RepairStatus<A> {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RepairStatus::NoViolationsInitially | RepairStatus::Repaired { .. }
        )
    }

    /// Short stable label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            RepairStatus::NoViolationsInitially => "no_violations_initially",
            RepairStatus::Repaired { .. } => "repaired",
            RepairStatus::Unsat => "unsat",
            RepairStatus::BudgetExhausted => "budget_exhausted",
            RepairStatus::Timeout => "timeout",
            RepairStatus::NoProgress => "no_progress",
            RepairStatus::UnboundHole { .. } => "unbound_hole",
        }
    }
}

/// Everything a repair request reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairReport<A> {
    pub status: RepairStatus<A>,
    /// Where the template came from; `None` when synthesis never ran.
    pub template_origin: Option<TemplateOrigin>,
    /// The signature the request was filed under; `None` when the input
    /// was already compliant.
    pub signature: Option<Signature>,
    pub constraints_learned: Vec<Constraint>,
    pub iterations: u64,
    pub candidates_tried: u64,
}

/// Top-level orchestrator for repair requests.
pub struct Controller<'a, A> {
    oracles: &'a [Box<dyn Oracle<A>>],
    executor: &'a dyn PatchExecutor<A>,
    fallback: &'a dyn FallbackTemplates,
    proposer: Option<&'a dyn TemplateProposer<A>>,
    budgets: Budgets,
}

impl<'a, A: Clone> Controller<'a, A> {
    pub fn new(
        oracles: &'a [Box<dyn Oracle<A>>],
        executor: &'a dyn PatchExecutor<A>,
        fallback: &'a dyn FallbackTemplates,
    ) -> Self {
        Controller {
            oracles,
            executor,
            fallback,
            proposer: None,
            budgets: Budgets::default(),
        }
    }

    pub fn with_proposer(mut self, proposer: &'a dyn TemplateProposer<A>) -> Self {
        self.proposer = Some(proposer);
        self
    }

    pub fn with_budgets(mut self, budgets: Budgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Run one repair request.
    ///
    /// `context` feeds the signature (application name, environment, …);
    /// `memory` is the optional repair bank; `now` stamps bank metadata so
    /// callers control the clock.
    pub fn repair(
        &self,
        artifact: &A,
        context: &BTreeMap<String, Value>,
        mut memory: Option<&mut dyn RepairMemory>,
        now: DateTime<Utc>,
    ) -> RepairReport<A> {
        let verifier = Verifier::new(self.oracles);
        let initial = verifier.run(artifact);
        if initial.is_clean() {
            info!("input artifact passes every oracle, nothing to repair");
            return RepairReport {
                status: RepairStatus::NoViolationsInitially,
                template_origin: None,
                signature: None,
                constraints_learned: Vec::new(),
                iterations: 0,
                candidates_tried: 0,
            };
        }

        let signature = Signature::from_violations(
            initial.failed_oracles.clone(),
            &initial.violations,
            context.clone(),
        );

        let (bundle, origin, prior_constraints) = self.acquire_template(
            artifact,
            &initial.violations,
            &signature,
            memory.as_deref(),
        );
        info!(
            origin = ?origin,
            holes = bundle.template.holes().len(),
            "template acquired"
        );

        let synthesizer = Synthesizer::new(Verifier::new(self.oracles), self.executor);
        let synthesis = match synthesizer.run(
            artifact,
            &bundle.template,
            &bundle.hole_space,
            &prior_constraints,
            &self.budgets,
        ) {
            Ok(synthesis) => synthesis,
            Err(EngineError::UnboundHole { hole }) | Err(EngineError::EmptyDomain { hole }) => {
                warn!(hole = %hole, "template rejected before enumeration");
                return RepairReport {
                    status: RepairStatus::UnboundHole { hole },
                    template_origin: Some(origin),
                    signature: Some(signature),
                    constraints_learned: Vec::new(),
                    iterations: 0,
                    candidates_tried: 0,
                };
            }
        };

        let memory: Option<&mut dyn RepairMemory> = match memory {
            Some(ref mut m) => Some(&mut **m),
            None => None,
        };
        self.conclude(synthesis, bundle, origin, signature, memory, now)
    }

    /// Template acquisition ladder: bank hit, else proposer, else the
    /// domain default. Prior constraints come only from the bank.
    fn acquire_template(
        &self,
        artifact: &A,
        violations: &[mend_core::Violation],
        signature: &Signature,
        memory: Option<&dyn RepairMemory>,
    ) -> (TemplateBundle, TemplateOrigin, Vec<Constraint>) {
        if let Some(hit) = memory.and_then(|m| m.lookup(signature)) {
            return (
                TemplateBundle::new(hit.template, hit.hole_space),
                TemplateOrigin::Bank,
                hit.constraints,
            );
        }
        if let Some(proposer) = self.proposer {
            match proposer.propose(artifact, violations) {
                Ok(bundle) => match bundle.validate() {
                    Ok(()) => return (bundle, TemplateOrigin::Proposer, Vec::new()),
                    Err(e) => warn!(error = %e, "proposer response rejected, using default template"),
                },
                Err(e) => warn!(error = %e, "proposer failed, using default template"),
            }
        }
        (self.fallback.fallback(violations), TemplateOrigin::Default, Vec::new())
    }

    fn conclude(
        &self,
        synthesis: Synthesis<A>,
        bundle: TemplateBundle,
        origin: TemplateOrigin,
        signature: Signature,
        memory: Option<&mut dyn RepairMemory>,
        now: DateTime<Utc>,
    ) -> RepairReport<A> {
        let Synthesis {
            verdict,
            constraints,
            iterations,
            candidates_tried,
            ..
        } = synthesis;

        let status = match verdict {
            SynthesisVerdict::Success { artifact, assignment } => {
                if let Some(memory) = memory {
                    memory.record_success(
                        &signature,
                        &bundle.template,
                        &bundle.hole_space,
                        &constraints,
                        &assignment,
                        candidates_tried,
                        now,
                    );
                }
                RepairStatus::Repaired { artifact, assignment }
            }
            SynthesisVerdict::Unsat => RepairStatus::Unsat,
            SynthesisVerdict::BudgetExhausted => RepairStatus::BudgetExhausted,
            SynthesisVerdict::Timeout => RepairStatus::Timeout,
            SynthesisVerdict::NoProgress => RepairStatus::NoProgress,
        };

        info!(status = status.label(), candidates_tried, iterations, "repair request finished");
        RepairReport {
            status,
            template_origin: Some(origin),
            signature: Some(signature),
            constraints_learned: constraints,
            iterations,
            candidates_tried,
        }
    }
}
