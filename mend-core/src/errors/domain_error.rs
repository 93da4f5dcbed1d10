//! Errors for the domain collaborators: patch executor, proposer, manifest
//! loading, and configuration.

use super::error_code::{self, MendErrorCode};

/// Errors from the domain patch executor. Per-candidate inside a synthesis
/// attempt, never terminal for the attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Unknown operation `{op}`")]
    UnknownOp { op: String },

    #[error("Operation `{op}` is missing argument `{arg}`")]
    MissingArg { op: String, arg: String },

    #[error("Operation `{op}` argument `{arg}`: expected {expected}")]
    BadArg { op: String, arg: String, expected: String },

    #[error("Operation `{op}` cannot be applied: {reason}")]
    InvalidTarget { op: String, reason: String },
}

impl MendErrorCode for ExecutorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownOp { .. } => error_code::EXECUTOR_UNKNOWN_OP,
            Self::MissingArg { .. } => error_code::EXECUTOR_MISSING_ARG,
            Self::BadArg { .. } => error_code::EXECUTOR_BAD_ARG,
            Self::InvalidTarget { .. } => error_code::EXECUTOR_INVALID_TARGET,
        }
    }
}

/// Errors from the remote template proposer. Both kinds trigger the
/// default-template fallback; the distinction matters only for logs.
#[derive(Debug, thiserror::Error)]
pub enum ProposerError {
    /// Transport failed: connect, timeout, non-success HTTP status.
    #[error("Proposer unavailable: {message}")]
    Unavailable { message: String },

    /// The proposer answered, but the document violates the transport
    /// contract (bad JSON, missing hole space, uncovered template holes).
    #[error("Proposer response malformed: {reason}")]
    Malformed { reason: String },
}

impl MendErrorCode for ProposerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_code::PROPOSER_UNAVAILABLE,
            Self::Malformed { .. } => error_code::PROPOSER_MALFORMED,
        }
    }
}

/// Errors loading or writing the artifact on disk.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("YAML parse error: {message}")]
    Parse { message: String },

    #[error("YAML serialization failed: {message}")]
    Serialize { message: String },
}

impl MendErrorCode for ManifestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::MANIFEST_IO,
            Self::Parse { .. } => error_code::MANIFEST_PARSE,
            Self::Serialize { .. } => error_code::MANIFEST_SERIALIZE,
        }
    }
}

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Config parse error: {message}")]
    Parse { message: String },
}

impl MendErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::CONFIG_IO,
            Self::Parse { .. } => error_code::CONFIG_PARSE,
        }
    }
}
