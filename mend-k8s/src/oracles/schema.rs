//! Structural schema checks: the fields any workload manifest must carry.
//!
//! Schema gaps are not hole-addressable, so these violations carry no
//! evidence — they still shape the signature and the fallback template.

use serde_yaml::Value as Yaml;

use mend_core::traits::Oracle;
use mend_core::types::violation::Violation;

use crate::manifest::Manifest;

pub const CODE_API_VERSION_MISSING: &str = "schema.api_version.missing";
pub const CODE_KIND_MISSING: &str = "schema.kind.missing";
pub const CODE_NAME_MISSING: &str = "schema.name.missing";
pub const CODE_CONTAINERS_MISSING: &str = "schema.containers.missing";
pub const CODE_CONTAINER_INCOMPLETE: &str = "schema.container.incomplete";

const WORKLOAD_KINDS: &[&str] = &[
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "Job",
    "Pod",
];

#[derive(Debug, Default)]
pub struct SchemaOracle;

impl SchemaOracle {
    pub fn new() -> Self {
        SchemaOracle
    }
}

impl Oracle<Manifest> for SchemaOracle {
    fn id(&self) -> &str {
        "schema"
    }

    fn check(&self, manifest: &Manifest) -> Vec<Violation> {
        let mut violations = Vec::new();

        if manifest.get_str("apiVersion").map_or(true, str::is_empty) {
            violations.push(Violation::new(CODE_API_VERSION_MISSING, "apiVersion is missing"));
        }
        let kind = manifest.kind();
        if kind.map_or(true, str::is_empty) {
            violations.push(Violation::new(CODE_KIND_MISSING, "kind is missing"));
        }
        if manifest.name().map_or(true, str::is_empty) {
            violations.push(Violation::new(CODE_NAME_MISSING, "metadata.name is missing"));
        }

        if let Some(kind) = kind {
            if WORKLOAD_KINDS.contains(&kind) {
                match manifest.containers() {
                    None => violations.push(Violation::new(
                        CODE_CONTAINERS_MISSING,
                        format!("{kind} declares no containers"),
                    )),
                    Some(containers) if containers.is_empty() => violations.push(Violation::new(
                        CODE_CONTAINERS_MISSING,
                        format!("{kind} declares an empty container list"),
                    )),
                    Some(containers) => {
                        for (i, container) in containers.iter().enumerate() {
                            let has_name = container
                                .get("name")
                                .and_then(Yaml::as_str)
                                .is_some_and(|s| !s.is_empty());
                            let has_image = container
                                .get("image")
                                .and_then(Yaml::as_str)
                                .is_some_and(|s| !s.is_empty());
                            if !has_name || !has_image {
                                violations.push(Violation::new(
                                    CODE_CONTAINER_INCOMPLETE,
                                    format!("container {i} is missing name or image"),
                                ));
                            }
                        }
                    }
                }
            }
        }
        violations
    }
}
