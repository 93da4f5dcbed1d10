//! Storage-layer errors for the repair bank file.

use super::error_code::{self, MendErrorCode};

/// Errors that can occur in the bank persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Bank file corrupted: {details}")]
    Corrupted { details: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Bank file locked: {message}")]
    Locked { message: String },

    #[error("Bank serialization failed: {message}")]
    Serialize { message: String },
}

impl MendErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Corrupted { .. } => error_code::BANK_CORRUPTED,
            Self::Io { .. } => error_code::BANK_IO,
            Self::Locked { .. } => error_code::BANK_LOCKED,
            Self::Serialize { .. } => error_code::BANK_SERIALIZE,
        }
    }
}
