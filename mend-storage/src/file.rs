//! Bank document I/O: a single JSON list of entries.
//!
//! Writes go to a sibling temp file and land with an atomic rename; an
//! advisory exclusive lock on `<bank>.lock` covers the whole save. Loads
//! take the shared side of the same lock.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;

use mend_core::errors::StorageError;
use mend_core::types::bank::BankEntry;

fn io_err(path: &Path, e: impl std::fmt::Display) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Advisory file lock guarding the bank file.
pub struct BankLock {
    lock_file: RwLock<File>,
}

impl BankLock {
    /// Create (or reuse) the `<bank>.lock` sibling of `bank_path`.
    pub fn new(bank_path: &Path) -> Result<Self, StorageError> {
        let lock_path = lock_path_for(bank_path);
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
        }
        let file = File::create(&lock_path).map_err(|e| io_err(&lock_path, e))?;
        Ok(BankLock {
            lock_file: RwLock::new(file),
        })
    }

    /// Shared lock for loading (non-blocking).
    pub fn read(&mut self) -> Result<fd_lock::RwLockReadGuard<'_, File>, StorageError> {
        self.lock_file.try_read().map_err(|_| StorageError::Locked {
            message: "a save is in progress; retry shortly".to_string(),
        })
    }

    /// Exclusive lock for saving (non-blocking).
    pub fn write(&mut self) -> Result<fd_lock::RwLockWriteGuard<'_, File>, StorageError> {
        self.lock_file.try_write().map_err(|_| StorageError::Locked {
            message: "another process holds the bank".to_string(),
        })
    }
}

fn lock_path_for(bank_path: &Path) -> PathBuf {
    let mut name = bank_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bank.json".to_string());
    name.push_str(".lock");
    bank_path.with_file_name(name)
}

/// Read and parse the bank document. A missing file is an empty bank;
/// anything unreadable or unparseable is `Corrupted`/`Io` for the caller
/// to absorb.
pub fn load_entries(path: &Path) -> Result<Vec<BankEntry>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut lock = BankLock::new(path)?;
    let _guard = lock.read()?;
    let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&text).map_err(|e| StorageError::Corrupted {
        details: e.to_string(),
    })
}

/// Serialise the entries and commit them atomically: write a sibling temp
/// file, then rename over the target.
pub fn save_entries(path: &Path, entries: &[BankEntry]) -> Result<(), StorageError> {
    let mut lock = BankLock::new(path)?;
    let _guard = lock.write()?;

    let text = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Serialize {
        message: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text).map_err(|e| io_err(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_bank() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_entries(&dir.path().join("bank.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn garbage_is_reported_as_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_entries(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { .. }));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        save_entries(&path, &[]).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
