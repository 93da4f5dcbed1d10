//! Stable error codes for every error surface.
//!
//! Codes are machine-readable identifiers that stay stable across message
//! rewording. Diagnostic output and logs key on these.

/// Maps an error variant to its stable code.
pub trait MendErrorCode {
    fn error_code(&self) -> &'static str;
}

// ── engine ──
pub const UNBOUND_HOLE: &str = "ENGINE_UNBOUND_HOLE";
pub const EMPTY_DOMAIN: &str = "ENGINE_EMPTY_DOMAIN";

// ── storage ──
pub const BANK_CORRUPTED: &str = "BANK_CORRUPTED";
pub const BANK_IO: &str = "BANK_IO";
pub const BANK_LOCKED: &str = "BANK_LOCKED";
pub const BANK_SERIALIZE: &str = "BANK_SERIALIZE";

// ── executor ──
pub const EXECUTOR_UNKNOWN_OP: &str = "EXECUTOR_UNKNOWN_OP";
pub const EXECUTOR_MISSING_ARG: &str = "EXECUTOR_MISSING_ARG";
pub const EXECUTOR_BAD_ARG: &str = "EXECUTOR_BAD_ARG";
pub const EXECUTOR_INVALID_TARGET: &str = "EXECUTOR_INVALID_TARGET";

// ── proposer ──
pub const PROPOSER_UNAVAILABLE: &str = "PROPOSER_UNAVAILABLE";
pub const PROPOSER_MALFORMED: &str = "PROPOSER_MALFORMED";

// ── manifest ──
pub const MANIFEST_IO: &str = "MANIFEST_IO";
pub const MANIFEST_PARSE: &str = "MANIFEST_PARSE";
pub const MANIFEST_SERIALIZE: &str = "MANIFEST_SERIALIZE";

// ── config ──
pub const CONFIG_IO: &str = "CONFIG_IO";
pub const CONFIG_PARSE: &str = "CONFIG_PARSE";
