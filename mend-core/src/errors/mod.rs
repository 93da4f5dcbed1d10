//! Error types for every layer, each with a stable error code.

pub mod domain_error;
pub mod engine_error;
pub mod error_code;
pub mod storage_error;

pub use domain_error::{ConfigError, ExecutorError, ManifestError, ProposerError};
pub use engine_error::EngineError;
pub use error_code::MendErrorCode;
pub use storage_error::StorageError;
