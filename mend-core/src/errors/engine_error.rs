//! Engine-layer errors: template/hole-space mismatches.

use super::error_code::{self, MendErrorCode};

/// Errors surfaced before or during a synthesis attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A template referenced a hole with no binding — either the hole space
    /// has no domain for it (caught before enumeration begins) or an
    /// assignment omitted it at instantiation time.
    #[error("No binding for hole `{hole}`")]
    UnboundHole { hole: String },

    /// A hole was given an empty domain. Caught at hole-space construction.
    #[error("Hole `{hole}` has an empty domain")]
    EmptyDomain { hole: String },
}

impl MendErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnboundHole { .. } => error_code::UNBOUND_HOLE,
            Self::EmptyDomain { .. } => error_code::EMPTY_DOMAIN,
        }
    }
}
