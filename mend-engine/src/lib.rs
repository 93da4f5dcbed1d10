//! # mend-engine
//!
//! The verification-and-synthesis engine: candidate enumerator, constraint
//! extractor, verifier, CEGIS synthesizer, and the repair controller.
//! Generic over the artifact type — the domain crates supply oracles and
//! the patch executor.

pub mod controller;
pub mod enumerator;
pub mod extractor;
pub mod instantiate;
pub mod synthesizer;
pub mod verifier;

pub use controller::{Controller, RepairReport, RepairStatus, TemplateOrigin};
pub use enumerator::{CandidateEnumerator, EnumeratorStats};
pub use instantiate::instantiate;
pub use synthesizer::{Budgets, Synthesis, SynthesisVerdict, Synthesizer};
pub use verifier::{Verdict, Verifier};
