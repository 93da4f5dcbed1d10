//! Container resource limits: present, and drawn from the permitted sets.

use serde_yaml::Value as Yaml;

use mend_core::config::PolicyConfig;
use mend_core::traits::Oracle;
use mend_core::types::violation::{Evidence, Violation};

use crate::manifest::Manifest;

pub const CODE_LIMITS_MISSING: &str = "resources.limits.missing";
pub const CODE_CPU_UNALLOWED: &str = "resources.cpu.unallowed";
pub const CODE_MEMORY_UNALLOWED: &str = "resources.memory.unallowed";

pub struct ResourceLimitOracle {
    allowed_cpu: Vec<String>,
    allowed_memory: Vec<String>,
    require_limits: bool,
}

impl ResourceLimitOracle {
    pub fn new(allowed_cpu: Vec<String>, allowed_memory: Vec<String>, require_limits: bool) -> Self {
        ResourceLimitOracle {
            allowed_cpu,
            allowed_memory,
            require_limits,
        }
    }

    pub fn from_config(policy: &PolicyConfig) -> Self {
        ResourceLimitOracle::new(
            policy.effective_allowed_cpu_limits(),
            policy.effective_allowed_memory_limits(),
            policy.effective_require_resource_limits(),
        )
    }

    fn inspect(&self, manifest: &Manifest) -> Result<Vec<Violation>, String> {
        let Some(containers) = manifest.containers() else {
            return Ok(Vec::new());
        };

        let mut violations = Vec::new();
        for container in containers {
            let name = container
                .get("name")
                .and_then(Yaml::as_str)
                .unwrap_or("<unnamed>");
            let limits = container.get("resources").and_then(|r| r.get("limits"));

            let Some(limits) = limits else {
                if self.require_limits {
                    violations.push(Violation::new(
                        CODE_LIMITS_MISSING,
                        format!("container `{name}` declares no resource limits"),
                    ));
                }
                continue;
            };
            if !limits.is_mapping() {
                return Err(format!("container `{name}` resources.limits is not a mapping"));
            }

            if let Some(cpu) = limits.get("cpu") {
                let rendered = scalar_to_string(cpu)
                    .ok_or_else(|| format!("container `{name}` cpu limit is not a scalar"))?;
                if !self.allowed_cpu.contains(&rendered) {
                    violations.push(
                        Violation::new(
                            CODE_CPU_UNALLOWED,
                            format!("container `{name}` cpu limit `{rendered}` is not permitted"),
                        )
                        .with_evidence(
                            Evidence::none().with_forbid_value("cpu_limit", rendered.as_str()),
                        ),
                    );
                }
            } else if self.require_limits {
                violations.push(Violation::new(
                    CODE_LIMITS_MISSING,
                    format!("container `{name}` declares no cpu limit"),
                ));
            }

            if let Some(memory) = limits.get("memory") {
                let rendered = scalar_to_string(memory)
                    .ok_or_else(|| format!("container `{name}` memory limit is not a scalar"))?;
                if !self.allowed_memory.contains(&rendered) {
                    violations.push(
                        Violation::new(
                            CODE_MEMORY_UNALLOWED,
                            format!("container `{name}` memory limit `{rendered}` is not permitted"),
                        )
                        .with_evidence(
                            Evidence::none().with_forbid_value("memory_limit", rendered.as_str()),
                        ),
                    );
                }
            } else if self.require_limits {
                violations.push(Violation::new(
                    CODE_LIMITS_MISSING,
                    format!("container `{name}` declares no memory limit"),
                ));
            }
        }
        Ok(violations)
    }
}

fn scalar_to_string(node: &Yaml) -> Option<String> {
    match node {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Oracle<Manifest> for ResourceLimitOracle {
    fn id(&self) -> &str {
        "resource-limits"
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

    fn oracle() -> ResourceLimitOracle {
        ResourceLimitOracle::new(
            vec!["250m".to_string(), "500m".to_string()],
            vec!["256Mi".to_string(), "512Mi".to_string()],
            true,
        )
    }

    fn pod(resources: &str) -> Manifest {
        Manifest::from_str(&format!(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n    - name: app\n      image: img\n{resources}"
        ))
        .unwrap()
    }

    #[test]
    fn missing_limits_violate_without_evidence() {
        let violations = oracle().check(&pod(""));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE_LIMITS_MISSING);
        assert!(violations[0].evidence.is_empty());
    }

    #[test]
    fn unallowed_cpu_carries_forbid_value_evidence() {
        let m = pod("      resources:\n        limits:\n          cpu: \"2\"\n          memory: 512Mi\n");
        let violations = oracle().check(&m);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE_CPU_UNALLOWED);
        let hv = &violations[0].evidence.forbid_value[0];
        assert_eq!(hv.hole, "cpu_limit");
    }

    #[test]
    fn allowed_limits_are_clean() {
        let m = pod("      resources:\n        limits:\n          cpu: 500m\n          memory: 256Mi\n");
        assert!(oracle().check(&m).is_empty());
    }

    #[test]
    fn limits_not_required_when_disabled() {
        let relaxed = ResourceLimitOracle::new(vec!["500m".into()], vec!["256Mi".into()], false);
        assert!(relaxed.check(&pod("")).is_empty());
    }

    #[test]
    fn malformed_limits_report_internal_failure() {
        let m = pod("      resources:\n        limits: not-a-map\n");
        let violations = oracle().check(&m);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, mend_core::types::violation::ORACLE_INTERNAL);
    }
}
