//! # mend-storage
//!
//! Persistence layer for the repair bank: a single JSON document with
//! atomic tmp-and-rename commits and an advisory file lock. Single-writer
//! by design; cross-process sharing means reload before lookup and save
//! after success.

pub mod bank;
pub mod file;

pub use bank::RepairBank;
pub use file::BankLock;
