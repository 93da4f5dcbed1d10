//! Patch model: operations, templates, holes, and their transport encoding.
//!
//! A template is an ordered operation list whose arguments may reference
//! holes; a patch is the same shape with every argument concrete. Holes are
//! global within one template: the same name in two operations is the same
//! value. On the wire a hole reference is the `{"$hole": "name"}` sentinel.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::Value;

/// The wire sentinel key marking a hole reference.
pub const HOLE_SENTINEL: &str = "$hole";

/// An operation argument: either a concrete value or a named hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Concrete(Value),
    Hole(String),
}

impl ArgValue {
    pub fn hole(name: impl Into<String>) -> Self {
        ArgValue::Hole(name.into())
    }

    pub fn concrete(value: impl Into<Value>) -> Self {
        ArgValue::Concrete(value.into())
    }

    pub fn as_hole(&self) -> Option<&str> {
        match self {
            ArgValue::Hole(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgValue::Concrete(v) => v.serialize(serializer),
            ArgValue::Hole(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(HOLE_SENTINEL, name)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ArgValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Value::Map(entries) = &value {
            if entries.len() == 1 {
                if let Some(Value::Str(name)) = entries.get(HOLE_SENTINEL) {
                    return Ok(ArgValue::Hole(name.clone()));
                }
            }
        }
        Ok(ArgValue::Concrete(value))
    }
}

/// A named-argument map preserving declaration order.
///
/// Serialises as a JSON map whose key order is the declaration order;
/// deserialisation keeps document order. Structural traversal over patches
/// and templates is deterministic because of this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgMap<V>(Vec<(String, V)>);

impl<V> ArgMap<V> {
    pub fn new() -> Self {
        ArgMap(Vec::new())
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for ArgMap<V> {
    fn default() -> Self {
        ArgMap::new()
    }
}

impl<V> FromIterator<(String, V)> for ArgMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = ArgMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for ArgMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ArgMapVisitor<V>(std::marker::PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for ArgMapVisitor<V> {
    type Value = ArgMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of argument names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ArgMap<V>, A::Error> {
        let mut map = ArgMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.set(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for ArgMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ArgMapVisitor(std::marker::PhantomData))
    }
}

/// One template operation: a domain-defined opcode plus named arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub op: String,
    #[serde(default)]
    pub args: ArgMap<ArgValue>,
}

impl Operation {
    pub fn new(op: impl Into<String>) -> Self {
        Operation {
            op: op.into(),
            args: ArgMap::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: ArgValue) -> Self {
        self.args.set(key, value);
        self
    }
}

/// One fully-instantiated operation: every argument concrete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(default)]
    pub args: ArgMap<Value>,
}

/// An ordered operation sequence, applied left to right. Later operations
/// see the state left by earlier ones; the sequence is not commutative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub ops: Vec<PatchOperation>,
}

/// Optional provenance attached to a template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TemplateMetadata {
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.version.is_none()
    }
}

/// A patch whose arguments may reference holes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchTemplate {
    pub ops: Vec<Operation>,
    #[serde(default, skip_serializing_if = "TemplateMetadata::is_empty")]
    pub metadata: TemplateMetadata,
}

impl PatchTemplate {
    pub fn new(ops: Vec<Operation>) -> Self {
        PatchTemplate {
            ops,
            metadata: TemplateMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: TemplateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Distinct hole names referenced by this template, in first-occurrence
    /// order over the operation list.
    pub fn holes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for op in &self.ops {
            for (_, arg) in op.args.iter() {
                if let ArgValue::Hole(name) = arg {
                    if !seen.contains(&name.as_str()) {
                        seen.push(name.as_str());
                    }
                }
            }
        }
        seen
    }
}
