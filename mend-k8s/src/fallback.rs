//! Default templates: the last resort when the bank misses and the
//! proposer is unavailable or malformed.
//!
//! The catalog always includes the replica/environment repair pair (the
//! workhorse for policy violations) and widens the template with security
//! and resource operations when the violation codes call for them. Hole
//! names follow the conventions the oracles emit evidence in.

use tracing::debug;

use mend_core::config::PolicyConfig;
use mend_core::traits::{FallbackTemplates, TemplateBundle};
use mend_core::types::patch::{ArgValue, Operation, PatchTemplate, TemplateMetadata};
use mend_core::types::space::HoleSpace;
use mend_core::types::value::Value;
use mend_core::types::violation::Violation;

pub struct DefaultTemplateCatalog {
    environments: Vec<Value>,
    replica_domain: Vec<Value>,
    cpu_domain: Vec<Value>,
    memory_domain: Vec<Value>,
}

impl DefaultTemplateCatalog {
    pub fn from_config(policy: &PolicyConfig) -> Self {
        DefaultTemplateCatalog {
            environments: policy
                .effective_environments()
                .into_iter()
                .map(Value::Str)
                .collect(),
            replica_domain: policy
                .effective_replica_domain()
                .into_iter()
                .map(Value::Int)
                .collect(),
            cpu_domain: policy
                .effective_allowed_cpu_limits()
                .into_iter()
                .map(Value::Str)
                .collect(),
            memory_domain: policy
                .effective_allowed_memory_limits()
                .into_iter()
                .map(Value::Str)
                .collect(),
        }
    }
}

fn insert_domain(space: &mut HoleSpace, name: &str, domain: Vec<Value>) {
    // Catalog domains come from effective_* accessors and are non-empty.
    if let Err(e) = space.insert(name, domain) {
        debug!(error = %e, hole = name, "skipping catalog hole");
    }
}

impl FallbackTemplates for DefaultTemplateCatalog {
    fn fallback(&self, violations: &[Violation]) -> TemplateBundle {
        let mut ops = vec![
            Operation::new("ensure_replicas").arg("replicas", ArgValue::hole("replicas")),
            Operation::new("ensure_label").arg("env", ArgValue::hole("env")),
        ];
        let mut space = HoleSpace::new();
        insert_domain(&mut space, "replicas", self.replica_domain.clone());
        insert_domain(&mut space, "env", self.environments.clone());

        let codes: Vec<&str> = violations.iter().map(|v| v.code.as_str()).collect();

        if codes.iter().any(|c| c.starts_with("security.")) {
            ops.push(
                Operation::new("set_security_context")
                    .arg("run_as_non_root", ArgValue::hole("run_as_non_root"))
                    .arg("privileged", ArgValue::hole("privileged")),
            );
            insert_domain(&mut space, "run_as_non_root", vec![Value::Bool(true)]);
            insert_domain(&mut space, "privileged", vec![Value::Bool(false)]);
        }

        if codes.iter().any(|c| c.starts_with("resources.")) {
            ops.push(
                Operation::new("set_resource_limits")
                    .arg("cpu", ArgValue::hole("cpu_limit"))
                    .arg("memory", ArgValue::hole("memory_limit")),
            );
            insert_domain(&mut space, "cpu_limit", self.cpu_domain.clone());
            insert_domain(&mut space, "memory_limit", self.memory_domain.clone());
        }

        let template = PatchTemplate::new(ops).with_metadata(TemplateMetadata {
            source: Some("default-catalog".to_string()),
            version: None,
        });
        TemplateBundle::new(template, space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DefaultTemplateCatalog {
        DefaultTemplateCatalog::from_config(&PolicyConfig::default())
    }

    #[test]
    fn base_template_covers_replicas_and_env() {
        let bundle = catalog().fallback(&[Violation::new("policy.replicas.window", "x")]);
        assert_eq!(bundle.template.holes(), vec!["replicas", "env"]);
        assert!(bundle.validate().is_ok());
        let names: Vec<&str> = bundle.hole_space.names().collect();
        assert_eq!(names, vec!["replicas", "env"]);
    }

    #[test]
    fn security_codes_widen_the_template() {
        let bundle = catalog().fallback(&[Violation::new("security.privileged", "x")]);
        assert!(bundle.template.holes().contains(&"run_as_non_root"));
        assert!(bundle.template.holes().contains(&"privileged"));
        assert!(bundle.validate().is_ok());
    }

    #[test]
    fn resource_codes_widen_the_template() {
        let bundle = catalog().fallback(&[Violation::new("resources.limits.missing", "x")]);
        assert!(bundle.template.holes().contains(&"cpu_limit"));
        assert!(bundle.template.holes().contains(&"memory_limit"));
        assert!(bundle.validate().is_ok());
    }
}
