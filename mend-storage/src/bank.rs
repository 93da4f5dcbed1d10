//! The repair bank: persistent memoisation of signature → repair pattern.
//!
//! Entries are created on the first success for a signature and mutated in
//! place on later hits: the stored template and hole space are frozen,
//! constraints merge by canonical set-union, the assignment and statistics
//! refresh. Document order is insertion order, so saves are stable and
//! diffs stay readable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use mend_core::errors::StorageError;
use mend_core::traits::{BankHit, RepairMemory};
use mend_core::types::bank::{BankEntry, EntryStats};
use mend_core::types::constraint::{Assignment, Constraint};
use mend_core::types::patch::PatchTemplate;
use mend_core::types::signature::Signature;
use mend_core::types::space::HoleSpace;

use crate::file;

/// Signature-indexed repair pattern store.
pub struct RepairBank {
    entries: Vec<BankEntry>,
    index: FxHashMap<Signature, usize>,
    path: Option<PathBuf>,
    load_error: Option<StorageError>,
}

impl RepairBank {
    /// An empty, unbacked bank (tests, `--no-bank` runs that still want
    /// in-process memoisation).
    pub fn in_memory() -> Self {
        RepairBank {
            entries: Vec::new(),
            index: FxHashMap::default(),
            path: None,
            load_error: None,
        }
    }

    /// Load the bank at `path`. Corrupted or unreadable content starts an
    /// empty bank and is remembered as a diagnostic — it never escapes as
    /// an error.
    pub fn load(path: &Path) -> Self {
        match file::load_entries(path) {
            Ok(entries) => {
                let index = entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (e.signature.clone(), i))
                    .collect();
                debug!(entries = entries.len(), path = %path.display(), "bank loaded");
                RepairBank {
                    entries,
                    index,
                    path: Some(path.to_path_buf()),
                    load_error: None,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bank unusable, starting empty");
                RepairBank {
                    entries: Vec::new(),
                    index: FxHashMap::default(),
                    path: Some(path.to_path_buf()),
                    load_error: Some(e),
                }
            }
        }
    }

    /// The load-time diagnostic, if the bank file was unusable.
    pub fn load_error(&self) -> Option<&StorageError> {
        self.load_error.as_ref()
    }

    /// Persist to the path the bank was loaded from.
    pub fn save(&self) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => file::save_entries(path, &self.entries),
            None => Ok(()),
        }
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        file::save_entries(path, &self.entries)
    }

    /// Iterate entries in document order, for diagnostics.
    pub fn entries(&self) -> impl Iterator<Item = &BankEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, signature: &Signature) -> Option<&BankEntry> {
        self.index.get(signature).map(|&i| &self.entries[i])
    }
}

/// Keep only constraints whose holes all exist in `space` and which the
/// latest successful assignment does not violate — the stored constraint
/// list must stay consistent with the stored assignment.
fn admissible(constraint: &Constraint, space: &HoleSpace, assignment: &Assignment) -> bool {
    constraint.holes().all(|h| space.contains(h)) && !constraint.violates(assignment)
}

impl RepairMemory for RepairBank {
    fn lookup(&self, signature: &Signature) -> Option<BankHit> {
        self.get(signature).map(|entry| BankHit {
            template: entry.template.clone(),
            hole_space: entry.hole_space.clone(),
            constraints: entry.learned_constraints.clone(),
        })
    }

    fn record_success(
        &mut self,
        signature: &Signature,
        template: &PatchTemplate,
        hole_space: &HoleSpace,
        constraints: &[Constraint],
        assignment: &Assignment,
        candidates_tried: u64,
        now: DateTime<Utc>,
    ) {
        match self.index.get(signature) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                // Stored template and hole space are kept; only constraints,
                // assignment, and statistics move.
                entry
                    .learned_constraints
                    .retain(|c| admissible(c, &entry.hole_space, assignment));
                for c in constraints {
                    if admissible(c, &entry.hole_space, assignment)
                        && !entry.learned_constraints.contains(c)
                    {
                        entry.learned_constraints.push(c.clone());
                    }
                }
                entry.successful_assignment = assignment.clone();
                entry.metadata.success_count += 1;
                entry.metadata.last_used = now;
                entry.metadata.candidates_tried += candidates_tried;
                debug!(success_count = entry.metadata.success_count, "bank entry merged");
            }
            None => {
                let learned_constraints = constraints
                    .iter()
                    .filter(|c| admissible(c, hole_space, assignment))
                    .cloned()
                    .collect();
                self.entries.push(BankEntry {
                    signature: signature.clone(),
                    template: template.clone(),
                    hole_space: hole_space.clone(),
                    learned_constraints,
                    successful_assignment: assignment.clone(),
                    metadata: EntryStats {
                        success_count: 1,
                        first_used: now,
                        last_used: now,
                        candidates_tried,
                    },
                    extra: Default::default(),
                });
                self.index.insert(signature.clone(), self.entries.len() - 1);
                debug!("bank entry created");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use mend_core::types::patch::{ArgValue, Operation};
    use mend_core::types::value::Value;

    fn signature() -> Signature {
        Signature::new(
            ["replica-policy".to_string()],
            ["policy.replicas.window".to_string()],
            BTreeMap::new(),
        )
    }

    fn template() -> PatchTemplate {
        PatchTemplate::new(vec![
            Operation::new("ensure_replicas").arg("replicas", ArgValue::hole("replicas")),
            Operation::new("ensure_label").arg("env", ArgValue::hole("env")),
        ])
    }

    fn space() -> HoleSpace {
        HoleSpace::from_pairs([
            ("replicas".to_string(), vec![Value::Int(2), Value::Int(3)]),
            (
                "env".to_string(),
                vec![Value::Str("staging".into()), Value::Str("prod".into())],
            ),
        ])
        .unwrap()
    }

    fn assignment(replicas: i64, env: &str) -> Assignment {
        [
            ("replicas".to_string(), Value::Int(replicas)),
            ("env".to_string(), Value::Str(env.into())),
        ]
        .into_iter()
        .collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn first_success_creates_an_entry() {
        let mut bank = RepairBank::in_memory();
        let tuple = Constraint::forbidden_tuple(vec![
            ("env".to_string(), Value::Str("prod".into())),
            ("replicas".to_string(), Value::Int(2)),
        ])
        .unwrap();
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[tuple.clone()],
            &assignment(2, "staging"),
            1,
            at(1_000),
        );
        let entry = bank.get(&signature()).unwrap();
        assert_eq!(entry.metadata.success_count, 1);
        assert_eq!(entry.metadata.first_used, at(1_000));
        assert_eq!(entry.learned_constraints, vec![tuple]);
    }

    #[test]
    fn merge_keeps_first_used_and_unions_constraints() {
        let mut bank = RepairBank::in_memory();
        let tuple = Constraint::forbidden_tuple(vec![
            ("env".to_string(), Value::Str("prod".into())),
            ("replicas".to_string(), Value::Int(2)),
        ])
        .unwrap();
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[tuple.clone()],
            &assignment(2, "staging"),
            3,
            at(1_000),
        );
        let extra = Constraint::forbidden_value("replicas", 2i64);
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[tuple.clone(), extra.clone()],
            &assignment(3, "prod"),
            1,
            at(2_000),
        );

        let entry = bank.get(&signature()).unwrap();
        assert_eq!(entry.metadata.success_count, 2);
        assert_eq!(entry.metadata.first_used, at(1_000));
        assert_eq!(entry.metadata.last_used, at(2_000));
        assert_eq!(entry.metadata.candidates_tried, 4);
        assert_eq!(entry.successful_assignment, assignment(3, "prod"));
        assert_eq!(entry.learned_constraints, vec![tuple, extra]);
    }

    #[test]
    fn merge_drops_constraints_on_unknown_holes() {
        let mut bank = RepairBank::in_memory();
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[],
            &assignment(3, "prod"),
            1,
            at(1_000),
        );
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[Constraint::forbidden_value("cpu_limit", "2")],
            &assignment(3, "prod"),
            1,
            at(2_000),
        );
        let entry = bank.get(&signature()).unwrap();
        assert!(entry.learned_constraints.is_empty());
    }

    #[test]
    fn constraints_stay_consistent_with_latest_assignment() {
        let mut bank = RepairBank::in_memory();
        // A constraint forbidding exactly the next success's assignment
        // must not survive the merge.
        let stale = Constraint::forbidden_value("env", "prod");
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[stale.clone()],
            &assignment(2, "staging"),
            1,
            at(1_000),
        );
        bank.record_success(
            &signature(),
            &template(),
            &space(),
            &[],
            &assignment(3, "prod"),
            1,
            at(2_000),
        );
        let entry = bank.get(&signature()).unwrap();
        assert!(entry
            .learned_constraints
            .iter()
            .all(|c| !c.violates(&entry.successful_assignment)));
        assert!(!entry.learned_constraints.contains(&stale));
    }

    #[test]
    fn failure_paths_never_touch_the_bank() {
        // The controller simply does not call record_success on failure;
        // lookup alone must not mutate anything.
        let bank = RepairBank::in_memory();
        assert!(bank.lookup(&signature()).is_none());
        assert_eq!(bank.len(), 0);
    }
}
