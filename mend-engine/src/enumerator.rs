//! Candidate enumerator: odometer order over a hole space, pruned by a
//! live constraint list.
//!
//! The hole list is taken in hole-space insertion order; the last hole's
//! value varies fastest. This gives one total order, reproducible across
//! runs. Constraints may be added mid-enumeration; the odometer position
//! only ever advances, so positions already yielded or skipped are never
//! revisited.

use mend_core::types::constraint::{Assignment, Constraint};
use mend_core::types::space::HoleSpace;
use mend_core::types::value::Value;

/// Counters the enumerator exposes so callers can tell "exhausted after
/// yields" apart from "exhausted because everything was pruned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnumeratorStats {
    /// Assignments handed to the caller.
    pub yielded: u64,
    /// Assignments skipped silently because a constraint forbade them.
    pub pruned: u64,
}

/// Lazy producer of constraint-respecting assignments.
pub struct CandidateEnumerator {
    holes: Vec<String>,
    domains: Vec<Vec<Value>>,
    /// Odometer indices of the next candidate position.
    cursor: Vec<usize>,
    exhausted: bool,
    constraints: Vec<Constraint>,
    stats: EnumeratorStats,
}

impl CandidateEnumerator {
    /// Build an enumerator over `space`, pruned by `constraints` from the
    /// first yield on.
    pub fn new(space: &HoleSpace, constraints: Vec<Constraint>) -> Self {
        let holes: Vec<String> = space.names().map(str::to_string).collect();
        let domains: Vec<Vec<Value>> = space.iter().map(|(_, d)| d.to_vec()).collect();
        let cursor = vec![0; holes.len()];
        CandidateEnumerator {
            holes,
            domains,
            cursor,
            exhausted: false,
            constraints,
            stats: EnumeratorStats::default(),
        }
    }

    /// Add a constraint mid-enumeration. Subsequent yields respect it;
    /// the current position is not rewound.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
    }

    /// The next assignment violating no currently-held constraint, or
    /// `None` once the odometer has overflowed past the first hole's last
    /// element. Pruned positions are skipped silently.
    pub fn next(&mut self) -> Option<Assignment> {
        loop {
            if self.exhausted {
                return None;
            }
            let candidate = self.current_assignment();
            self.advance();
            if self.constraints.iter().any(|c| c.violates(&candidate)) {
                self.stats.pruned += 1;
                continue;
            }
            self.stats.yielded += 1;
            return Some(candidate);
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn stats(&self) -> EnumeratorStats {
        self.stats
    }

    /// Size of the unpruned cross-product.
    pub fn product_size(&self) -> u128 {
        self.domains
            .iter()
            .fold(1u128, |acc, d| acc.saturating_mul(d.len() as u128))
    }

    fn current_assignment(&self) -> Assignment {
        self.holes
            .iter()
            .zip(&self.domains)
            .zip(&self.cursor)
            .map(|((hole, domain), &i)| (hole.clone(), domain[i].clone()))
            .collect()
    }

    /// Step the odometer: last hole fastest, carry leftwards, overflow past
    /// the first hole ends the sequence. Zero holes means a single (empty)
    /// position.
    fn advance(&mut self) {
        for i in (0..self.cursor.len()).rev() {
            self.cursor[i] += 1;
            if self.cursor[i] < self.domains[i].len() {
                return;
            }
            self.cursor[i] = 0;
        }
        self.exhausted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(pairs: &[(&str, &[i64])]) -> HoleSpace {
        HoleSpace::from_pairs(pairs.iter().map(|(name, domain)| {
            (
                name.to_string(),
                domain.iter().map(|&i| Value::Int(i)).collect(),
            )
        }))
        .unwrap()
    }

    fn drain(en: &mut CandidateEnumerator) -> Vec<Assignment> {
        let mut out = Vec::new();
        while let Some(a) = en.next() {
            out.push(a);
        }
        out
    }

    #[test]
    fn odometer_order_last_hole_fastest() {
        let s = space(&[("a", &[0, 1]), ("b", &[10, 20, 30])]);
        let mut en = CandidateEnumerator::new(&s, Vec::new());
        let all = drain(&mut en);
        assert_eq!(all.len(), 6);
        let pairs: Vec<(i64, i64)> = all
            .iter()
            .map(|a| (a["a"].as_int().unwrap(), a["b"].as_int().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![(0, 10), (0, 20), (0, 30), (1, 10), (1, 20), (1, 30)]
        );
        assert!(en.is_exhausted());
    }

    #[test]
    fn zero_holes_yield_one_empty_assignment() {
        let s = HoleSpace::new();
        let mut en = CandidateEnumerator::new(&s, Vec::new());
        let all = drain(&mut en);
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn forbidden_value_prunes_a_slice() {
        let s = space(&[("a", &[0, 1]), ("b", &[10, 20])]);
        let constraints = vec![Constraint::forbidden_value("a", 0i64)];
        let mut en = CandidateEnumerator::new(&s, constraints);
        let all = drain(&mut en);
        assert!(all.iter().all(|a| a["a"] == Value::Int(1)));
        assert_eq!(en.stats().pruned, 2);
        assert_eq!(en.stats().yielded, 2);
    }

    #[test]
    fn mid_enumeration_constraint_is_respected_without_rewind() {
        let s = space(&[("a", &[0, 1, 2])]);
        let mut en = CandidateEnumerator::new(&s, Vec::new());
        let first = en.next().unwrap();
        assert_eq!(first["a"], Value::Int(0));
        en.add_constraint(Constraint::forbidden_value("a", 1i64));
        let rest = drain(&mut en);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["a"], Value::Int(2));
    }

    #[test]
    fn all_pruned_is_distinguishable_from_plain_exhaustion() {
        let s = space(&[("a", &[0])]);
        let mut en = CandidateEnumerator::new(&s, vec![Constraint::forbidden_value("a", 0i64)]);
        assert!(en.next().is_none());
        assert!(en.is_exhausted());
        assert_eq!(en.stats().yielded, 0);
        assert_eq!(en.stats().pruned, 1);
        assert_eq!(en.stats().pruned as u128, en.product_size());
    }
}
