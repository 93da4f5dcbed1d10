//! # mend-core
//!
//! Foundation crate for the Mend repair engine.
//! Defines the patch model, constraints, violations, signatures, errors,
//! configuration, and the trait seams every other crate implements.

pub mod config;
pub mod errors;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::MendConfig;
pub use errors::error_code::MendErrorCode;
pub use errors::EngineError;
pub use types::bank::{BankEntry, EntryStats};
pub use types::constraint::{Assignment, Constraint};
pub use types::patch::{ArgMap, ArgValue, Operation, Patch, PatchOperation, PatchTemplate};
pub use types::signature::Signature;
pub use types::space::HoleSpace;
pub use types::value::Value;
pub use types::violation::{Evidence, HoleValue, Violation};
