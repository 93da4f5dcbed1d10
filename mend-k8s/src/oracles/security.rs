//! Container security context checks: no privileged containers, and
//! runAsNonRoot must be set when the policy requires it.

use serde_yaml::Value as Yaml;

use mend_core::config::PolicyConfig;
use mend_core::traits::Oracle;
use mend_core::types::violation::{Evidence, Violation};

use crate::manifest::Manifest;

pub const CODE_PRIVILEGED: &str = "security.privileged";
pub const CODE_RUN_AS_NON_ROOT: &str = "security.run_as_non_root";

pub struct SecurityContextOracle {
    require_run_as_non_root: bool,
}

impl SecurityContextOracle {
    pub fn new(require_run_as_non_root: bool) -> Self {
        SecurityContextOracle {
            require_run_as_non_root,
        }
    }

    pub fn from_config(policy: &PolicyConfig) -> Self {
        SecurityContextOracle::new(policy.effective_require_run_as_non_root())
    }
}

impl Oracle<Manifest> for SecurityContextOracle {
    fn id(&self) -> &str {
        "security-context"
    }

    fn check(&self, manifest: &Manifest) -> Vec<Violation> {
        let Some(containers) = manifest.containers() else {
            // Nothing with a security context; the schema oracle owns
            // structural complaints.
            return Vec::new();
        };

        let mut violations = Vec::new();
        for container in containers {
            let name = container
                .get("name")
                .and_then(Yaml::as_str)
                .unwrap_or("<unnamed>");
            let context = container.get("securityContext");

            let privileged = context
                .and_then(|c| c.get("privileged"))
                .and_then(Yaml::as_bool)
                .unwrap_or(false);
            if privileged {
                violations.push(
                    Violation::new(
                        CODE_PRIVILEGED,
                        format!("container `{name}` runs privileged"),
                    )
                    .with_evidence(Evidence::none().with_forbid_value("privileged", true)),
                );
            }

            let run_as_non_root = context
                .and_then(|c| c.get("runAsNonRoot"))
                .and_then(Yaml::as_bool)
                .unwrap_or(false);
            if self.require_run_as_non_root && !run_as_non_root {
                violations.push(
                    Violation::new(
                        CODE_RUN_AS_NON_ROOT,
                        format!("container `{name}` does not set runAsNonRoot"),
                    )
                    .with_evidence(Evidence::none().with_forbid_value("run_as_non_root", false)),
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(security_context: &str) -> Manifest {
        Manifest::from_str(&format!(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n    - name: app\n      image: img\n{security_context}"
        ))
        .unwrap()
    }

    #[test]
    fn privileged_container_violates() {
        let m = pod("      securityContext:\n        privileged: true\n        runAsNonRoot: true\n");
        let violations = SecurityContextOracle::new(true).check(&m);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE_PRIVILEGED);
        assert_eq!(violations[0].evidence.forbid_value[0].hole, "privileged");
    }

    #[test]
    fn missing_run_as_non_root_violates_when_required() {
        let m = pod("");
        let violations = SecurityContextOracle::new(true).check(&m);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE_RUN_AS_NON_ROOT);
    }

    #[test]
    fn compliant_context_is_clean() {
        let m = pod("      securityContext:\n        runAsNonRoot: true\n");
        assert!(SecurityContextOracle::new(true).check(&m).is_empty());
    }

    #[test]
    fn run_as_non_root_not_required_when_disabled() {
        let m = pod("");
        assert!(SecurityContextOracle::new(false).check(&m).is_empty());
    }

    #[test]
    fn violations_are_per_container_in_order() {
        let m = Manifest::from_str(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n    - name: a\n      image: img\n    - name: b\n      image: img\n",
        )
        .unwrap();
        let violations = SecurityContextOracle::new(true).check(&m);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("`a`"));
        assert!(violations[1].message.contains("`b`"));
    }
}
