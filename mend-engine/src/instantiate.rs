//! Template instantiation: substitute an assignment into a template.

use mend_core::errors::EngineError;
use mend_core::types::constraint::Assignment;
use mend_core::types::patch::{ArgValue, Patch, PatchOperation, PatchTemplate};

/// Replace every hole reference in `template` with its assigned value.
///
/// The traversal is deterministic and preserves operation order and
/// argument declaration order. A referenced hole absent from the
/// assignment fails with `UnboundHole`.
pub fn instantiate(template: &PatchTemplate, assignment: &Assignment) -> Result<Patch, EngineError> {
    let mut ops = Vec::with_capacity(template.ops.len());
    for op in &template.ops {
        let mut instantiated = PatchOperation {
            op: op.op.clone(),
            args: Default::default(),
        };
        for (key, arg) in op.args.iter() {
            let value = match arg {
                ArgValue::Concrete(v) => v.clone(),
                ArgValue::Hole(name) => assignment
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EngineError::UnboundHole { hole: name.clone() })?,
            };
            instantiated.args.set(key, value);
        }
        ops.push(instantiated);
    }
    Ok(Patch { ops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_core::types::patch::Operation;
    use mend_core::types::value::Value;

    fn template() -> PatchTemplate {
        PatchTemplate::new(vec![
            Operation::new("ensure_replicas").arg("replicas", ArgValue::hole("replicas")),
            Operation::new("ensure_label")
                .arg("env", ArgValue::hole("env"))
                .arg("team", ArgValue::concrete("payments")),
        ])
    }

    #[test]
    fn holes_are_substituted_and_concretes_kept() {
        let assignment: Assignment = [
            ("replicas".to_string(), Value::Int(3)),
            ("env".to_string(), Value::Str("prod".into())),
        ]
        .into_iter()
        .collect();
        let patch = instantiate(&template(), &assignment).unwrap();
        assert_eq!(patch.ops[0].args.get("replicas"), Some(&Value::Int(3)));
        assert_eq!(patch.ops[1].args.get("env"), Some(&Value::Str("prod".into())));
        assert_eq!(patch.ops[1].args.get("team"), Some(&Value::Str("payments".into())));
    }

    #[test]
    fn missing_binding_is_unbound_hole() {
        let assignment: Assignment = [("replicas".to_string(), Value::Int(3))].into_iter().collect();
        let err = instantiate(&template(), &assignment).unwrap_err();
        assert_eq!(err, EngineError::UnboundHole { hole: "env".into() });
    }

    #[test]
    fn same_hole_in_two_operations_gets_the_same_value() {
        let t = PatchTemplate::new(vec![
            Operation::new("ensure_label").arg("env", ArgValue::hole("env")),
            Operation::new("ensure_annotation").arg("env", ArgValue::hole("env")),
        ]);
        let assignment: Assignment =
            [("env".to_string(), Value::Str("staging".into()))].into_iter().collect();
        let patch = instantiate(&t, &assignment).unwrap();
        assert_eq!(patch.ops[0].args.get("env"), patch.ops[1].args.get("env"));
    }
}
