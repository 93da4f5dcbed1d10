//! Replica-count policy: production workloads must run inside the
//! configured replica window.

use mend_core::config::PolicyConfig;
use mend_core::traits::Oracle;
use mend_core::types::violation::{Evidence, HoleValue, Violation};

use crate::manifest::Manifest;

pub const CODE_REPLICA_WINDOW: &str = "policy.replicas.window";

pub struct ReplicaPolicyOracle {
    production_environments: Vec<String>,
    min_replicas: i64,
    max_replicas: i64,
}

impl ReplicaPolicyOracle {
    pub fn new(production_environments: Vec<String>, min_replicas: i64, max_replicas: i64) -> Self {
        ReplicaPolicyOracle {
            production_environments,
            min_replicas,
            max_replicas,
        }
    }

    pub fn from_config(policy: &PolicyConfig) -> Self {
        ReplicaPolicyOracle::new(
            policy.effective_production_environments(),
            policy.effective_min_production_replicas(),
            policy.effective_max_production_replicas(),
        )
    }

    fn inspect(&self, manifest: &Manifest) -> Result<Vec<Violation>, String> {
        let Some(env) = manifest.get_str("metadata.labels.env") else {
            // No environment label: the window rule does not apply.
            return Ok(Vec::new());
        };
        if !self.production_environments.iter().any(|e| e == env) {
            return Ok(Vec::new());
        }

        // An absent replica count behaves as the API default of one.
        let replicas = match manifest.get("spec.replicas") {
            None => 1,
            Some(node) => node
                .as_i64()
                .ok_or_else(|| "spec.replicas is not an integer".to_string())?,
        };

        if (self.min_replicas..=self.max_replicas).contains(&replicas) {
            return Ok(Vec::new());
        }

        let violation = Violation::new(
            CODE_REPLICA_WINDOW,
            format!(
                "environment `{env}` requires between {} and {} replicas, found {replicas}",
                self.min_replicas, self.max_replicas
            ),
        )
        .with_evidence(Evidence::none().with_forbid_tuple(vec![
            HoleValue::new("env", env),
            HoleValue::new("replicas", replicas),
        ]));
        Ok(vec![violation])
    }
}

impl Oracle<Manifest> for ReplicaPolicyOracle {
    fn id(&self) -> &str {
        "replica-policy"
    }

    fn check(&self, manifest: &Manifest) -> Vec<Violation> {
        match self.inspect(manifest) {
            Ok(violations) => violations,
            Err(message) => vec![Violation::internal(self.id(), message)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_core::types::violation::ORACLE_INTERNAL;

    fn oracle() -> ReplicaPolicyOracle {
        ReplicaPolicyOracle::new(vec!["prod".to_string()], 3, 5)
    }

    fn manifest(env: &str, replicas: &str) -> Manifest {
        Manifest::from_str(&format!(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  labels:\n    env: {env}\nspec:\n  replicas: {replicas}\n"
        ))
        .unwrap()
    }

    #[test]
    fn production_outside_window_violates_with_tuple_evidence() {
        let violations = oracle().check(&manifest("prod", "2"));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE_REPLICA_WINDOW);
        let tuple = &violations[0].evidence.forbid_tuple[0];
        assert_eq!(tuple[0].hole, "env");
        assert_eq!(tuple[1].hole, "replicas");
    }

    #[test]
    fn production_inside_window_is_clean() {
        assert!(oracle().check(&manifest("prod", "3")).is_empty());
        assert!(oracle().check(&manifest("prod", "5")).is_empty());
    }

    #[test]
    fn non_production_is_exempt() {
        assert!(oracle().check(&manifest("staging", "1")).is_empty());
    }

    #[test]
    fn missing_replicas_defaults_to_one() {
        let m = Manifest::from_str(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  labels:\n    env: prod\nspec: {}\n",
        )
        .unwrap();
        let violations = oracle().check(&m);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn garbage_replica_value_reports_internal_failure() {
        let violations = oracle().check(&manifest("prod", "two"));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, ORACLE_INTERNAL);
        assert!(violations[0].evidence.is_empty());
    }

    #[test]
    fn check_is_deterministic() {
        let m = manifest("prod", "2");
        assert_eq!(oracle().check(&m), oracle().check(&m));
    }
}
