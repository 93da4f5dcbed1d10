//! Patch executor for Kubernetes manifests.
//!
//! Opcode strings are parsed into `PatchOp` at the boundary; the engine
//! never sees this enum. Every operation is a structural edit on the YAML
//! tree that creates intermediate mappings as needed and leaves unrelated
//! nodes untouched. The executor is pure with respect to its input: it
//! clones the manifest and returns the edited copy.

use serde_yaml::{Mapping, Value as Yaml};

use mend_core::errors::ExecutorError;
use mend_core::traits::PatchExecutor;
use mend_core::types::patch::{Patch, PatchOperation};
use mend_core::types::value::Value;

use crate::manifest::Manifest;

/// One parsed operation.
#[derive(Debug, Clone, PartialEq)]
enum PatchOp {
    EnsureReplicas {
        count: i64,
    },
    /// Each argument is one label key to set.
    EnsureLabels {
        labels: Vec<(String, String)>,
    },
    EnsureAnnotations {
        entries: Vec<(String, String)>,
    },
    SetImage {
        container: Option<String>,
        image: String,
    },
    SetEnvVar {
        container: Option<String>,
        name: String,
        value: String,
    },
    SetResourceRequests {
        container: Option<String>,
        cpu: Option<String>,
        memory: Option<String>,
    },
    SetResourceLimits {
        container: Option<String>,
        cpu: Option<String>,
        memory: Option<String>,
    },
    SetSecurityContext {
        container: Option<String>,
        run_as_non_root: Option<bool>,
        privileged: Option<bool>,
    },
    SetServiceAccount {
        name: String,
    },
}

/// Applies concrete patches to manifests.
#[derive(Debug, Default)]
pub struct K8sPatchExecutor;

impl K8sPatchExecutor {
    pub fn new() -> Self {
        K8sPatchExecutor
    }
}

impl PatchExecutor<Manifest> for K8sPatchExecutor {
    fn apply(&self, artifact: &Manifest, patch: &Patch) -> Result<Manifest, ExecutorError> {
        let mut manifest = artifact.clone();
        for op in &patch.ops {
            let parsed = PatchOp::parse(op)?;
            parsed.apply(manifest.doc_mut())?;
        }
        Ok(manifest)
    }
}

impl PatchOp {
    fn parse(op: &PatchOperation) -> Result<Self, ExecutorError> {
        match op.op.as_str() {
            "ensure_replicas" => Ok(PatchOp::EnsureReplicas {
                count: int_arg(op, "replicas")?,
            }),
            "ensure_label" => Ok(PatchOp::EnsureLabels {
                labels: string_entries(op)?,
            }),
            "ensure_annotation" => Ok(PatchOp::EnsureAnnotations {
                entries: string_entries(op)?,
            }),
            "set_image" => Ok(PatchOp::SetImage {
                container: opt_str_arg(op, "container")?,
                image: str_arg(op, "image")?,
            }),
            "set_env_var" => Ok(PatchOp::SetEnvVar {
                container: opt_str_arg(op, "container")?,
                name: str_arg(op, "name")?,
                value: str_arg(op, "value")?,
            }),
            "set_resource_requests" => Ok(PatchOp::SetResourceRequests {
                container: opt_str_arg(op, "container")?,
                cpu: opt_str_arg(op, "cpu")?,
                memory: opt_str_arg(op, "memory")?,
            }),
            "set_resource_limits" => Ok(PatchOp::SetResourceLimits {
                container: opt_str_arg(op, "container")?,
                cpu: opt_str_arg(op, "cpu")?,
                memory: opt_str_arg(op, "memory")?,
            }),
            "set_security_context" => Ok(PatchOp::SetSecurityContext {
                container: opt_str_arg(op, "container")?,
                run_as_non_root: opt_bool_arg(op, "run_as_non_root")?,
                privileged: opt_bool_arg(op, "privileged")?,
            }),
            "set_service_account" => Ok(PatchOp::SetServiceAccount {
                name: str_arg(op, "name")?,
            }),
            other => Err(ExecutorError::UnknownOp { op: other.to_string() }),
        }
    }

    fn apply(&self, doc: &mut Yaml) -> Result<(), ExecutorError> {
        match self {
            PatchOp::EnsureReplicas { count } => {
                let spec = ensure_mapping_path(doc, &["spec"], "ensure_replicas")?;
                spec.insert(key("replicas"), Yaml::Number((*count).into()));
                Ok(())
            }
            PatchOp::EnsureLabels { labels } => {
                let target = ensure_mapping_path(doc, &["metadata", "labels"], "ensure_label")?;
                for (k, v) in labels {
                    target.insert(key(k), Yaml::String(v.clone()));
                }
                Ok(())
            }
            PatchOp::EnsureAnnotations { entries } => {
                let target =
                    ensure_mapping_path(doc, &["metadata", "annotations"], "ensure_annotation")?;
                for (k, v) in entries {
                    target.insert(key(k), Yaml::String(v.clone()));
                }
                Ok(())
            }
            PatchOp::SetImage { container, image } => {
                for_each_container(doc, container.as_deref(), "set_image", |c| {
                    c.insert(key("image"), Yaml::String(image.clone()));
                    Ok(())
                })
            }
            PatchOp::SetEnvVar { container, name, value } => {
                for_each_container(doc, container.as_deref(), "set_env_var", |c| {
                    set_env_entry(c, name, value);
                    Ok(())
                })
            }
            PatchOp::SetResourceRequests { container, cpu, memory } => {
                set_resources(doc, container.as_deref(), "requests", "set_resource_requests", cpu, memory)
            }
            PatchOp::SetResourceLimits { container, cpu, memory } => {
                set_resources(doc, container.as_deref(), "limits", "set_resource_limits", cpu, memory)
            }
            PatchOp::SetSecurityContext { container, run_as_non_root, privileged } => {
                for_each_container(doc, container.as_deref(), "set_security_context", |c| {
                    let ctx = ensure_child_mapping(c, "securityContext");
                    if let Some(flag) = run_as_non_root {
                        ctx.insert(key("runAsNonRoot"), Yaml::Bool(*flag));
                    }
                    if let Some(flag) = privileged {
                        ctx.insert(key("privileged"), Yaml::Bool(*flag));
                    }
                    Ok(())
                })
            }
            PatchOp::SetServiceAccount { name } => {
                let pod_spec = pod_spec_mapping(doc, "set_service_account")?;
                pod_spec.insert(key("serviceAccountName"), Yaml::String(name.clone()));
                Ok(())
            }
        }
    }
}

// ── argument extraction ──

fn arg<'a>(op: &'a PatchOperation, name: &str) -> Result<&'a Value, ExecutorError> {
    op.args.get(name).ok_or_else(|| ExecutorError::MissingArg {
        op: op.op.clone(),
        arg: name.to_string(),
    })
}

fn int_arg(op: &PatchOperation, name: &str) -> Result<i64, ExecutorError> {
    arg(op, name)?.as_int().ok_or_else(|| ExecutorError::BadArg {
        op: op.op.clone(),
        arg: name.to_string(),
        expected: "an integer".to_string(),
    })
}

fn str_arg(op: &PatchOperation, name: &str) -> Result<String, ExecutorError> {
    match arg(op, name)? {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(ExecutorError::BadArg {
            op: op.op.clone(),
            arg: name.to_string(),
            expected: "a string".to_string(),
        }),
    }
}

fn opt_str_arg(op: &PatchOperation, name: &str) -> Result<Option<String>, ExecutorError> {
    match op.args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ExecutorError::BadArg {
            op: op.op.clone(),
            arg: name.to_string(),
            expected: "a string".to_string(),
        }),
    }
}

fn opt_bool_arg(op: &PatchOperation, name: &str) -> Result<Option<bool>, ExecutorError> {
    match op.args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ExecutorError::BadArg {
            op: op.op.clone(),
            arg: name.to_string(),
            expected: "a boolean".to_string(),
        }),
    }
}

/// All arguments of an op, coerced to label-style strings. Scalars only:
/// structured values have no label rendition.
fn string_entries(op: &PatchOperation) -> Result<Vec<(String, String)>, ExecutorError> {
    let mut out = Vec::with_capacity(op.args.len());
    for (k, v) in op.args.iter() {
        let rendered = match v {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ExecutorError::BadArg {
                    op: op.op.clone(),
                    arg: k.to_string(),
                    expected: "a scalar".to_string(),
                })
            }
        };
        out.push((k.to_string(), rendered));
    }
    if out.is_empty() {
        return Err(ExecutorError::MissingArg {
            op: op.op.clone(),
            arg: "<any>".to_string(),
        });
    }
    Ok(out)
}

// ── YAML tree edits ──

fn key(name: &str) -> Yaml {
    Yaml::String(name.to_string())
}

/// Descend through `path`, creating empty mappings along the way, and
/// return the final mapping. A non-mapping node on the way (other than
/// null, which is promoted) is a target error.
fn ensure_mapping_path<'a>(
    doc: &'a mut Yaml,
    path: &[&str],
    op: &str,
) -> Result<&'a mut Mapping, ExecutorError> {
    let mut node = doc;
    for segment in path {
        let map = as_mapping(node, op)?;
        node = map.entry(key(segment)).or_insert(Yaml::Null);
    }
    as_mapping(node, op)
}

fn as_mapping<'a>(node: &'a mut Yaml, op: &str) -> Result<&'a mut Mapping, ExecutorError> {
    if node.is_null() {
        *node = Yaml::Mapping(Mapping::new());
    }
    node.as_mapping_mut().ok_or_else(|| ExecutorError::InvalidTarget {
        op: op.to_string(),
        reason: "expected a mapping node".to_string(),
    })
}

fn ensure_child_mapping<'a>(parent: &'a mut Mapping, name: &str) -> &'a mut Mapping {
    let node = parent.entry(key(name)).or_insert(Yaml::Null);
    if node.is_null() || node.as_mapping().is_none() {
        *node = Yaml::Mapping(Mapping::new());
    }
    // Promoted to a mapping just above.
    match node.as_mapping_mut() {
        Some(map) => map,
        None => unreachable!("node was promoted to a mapping"),
    }
}

/// The pod spec mapping, wherever it lives: `spec.template.spec` for
/// workloads, `spec` for bare pods.
fn pod_spec_mapping<'a>(doc: &'a mut Yaml, op: &str) -> Result<&'a mut Mapping, ExecutorError> {
    let workload_shape = doc
        .get("spec")
        .map(|spec| spec.get("template").is_some())
        .unwrap_or(false);
    if workload_shape {
        ensure_mapping_path(doc, &["spec", "template", "spec"], op)
    } else {
        ensure_mapping_path(doc, &["spec"], op)
    }
}

/// Run `edit` on the selected containers. `None` selects every container;
/// a name selects exactly one. An empty or missing list is a target error:
/// container edits cannot conjure a workload out of nothing.
fn for_each_container(
    doc: &mut Yaml,
    which: Option<&str>,
    op: &str,
    mut edit: impl FnMut(&mut Mapping) -> Result<(), ExecutorError>,
) -> Result<(), ExecutorError> {
    let pod_spec = pod_spec_mapping(doc, op)?;
    let containers = pod_spec
        .get_mut(&key("containers"))
        .and_then(Yaml::as_sequence_mut)
        .filter(|seq| !seq.is_empty())
        .ok_or_else(|| ExecutorError::InvalidTarget {
            op: op.to_string(),
            reason: "manifest has no containers".to_string(),
        })?;

    let mut matched = false;
    for container in containers.iter_mut() {
        let map = match container.as_mapping_mut() {
            Some(map) => map,
            None => continue,
        };
        let selected = match which {
            None => true,
            Some(name) => map.get(&key("name")).and_then(Yaml::as_str) == Some(name),
        };
        if selected {
            matched = true;
            edit(map)?;
        }
    }
    if !matched {
        return Err(ExecutorError::InvalidTarget {
            op: op.to_string(),
            reason: match which {
                Some(name) => format!("no container named `{name}`"),
                None => "no editable containers".to_string(),
            },
        });
    }
    Ok(())
}

fn set_env_entry(container: &mut Mapping, name: &str, value: &str) {
    let env = container.entry(key("env")).or_insert(Yaml::Null);
    if !matches!(env, Yaml::Sequence(_)) {
        *env = Yaml::Sequence(Vec::new());
    }
    if let Yaml::Sequence(entries) = env {
        for entry in entries.iter_mut() {
            if entry.get("name").and_then(Yaml::as_str) == Some(name) {
                if let Some(map) = entry.as_mapping_mut() {
                    map.insert(key("value"), Yaml::String(value.to_string()));
                }
                return;
            }
        }
        let mut fresh = Mapping::new();
        fresh.insert(key("name"), Yaml::String(name.to_string()));
        fresh.insert(key("value"), Yaml::String(value.to_string()));
        entries.push(Yaml::Mapping(fresh));
    }
}

fn set_resources(
    doc: &mut Yaml,
    container: Option<&str>,
    section: &str,
    op: &str,
    cpu: &Option<String>,
    memory: &Option<String>,
) -> Result<(), ExecutorError> {
    if cpu.is_none() && memory.is_none() {
        return Err(ExecutorError::MissingArg {
            op: op.to_string(),
            arg: "cpu|memory".to_string(),
        });
    }
    for_each_container(doc, container, op, |c| {
        let resources = ensure_child_mapping(c, "resources");
        let target = ensure_child_mapping(resources, section);
        if let Some(cpu) = cpu {
            target.insert(key("cpu"), Yaml::String(cpu.clone()));
        }
        if let Some(memory) = memory {
            target.insert(key("memory"), Yaml::String(memory.clone()));
        }
        Ok(())
    })
}
