//! Hole spaces: insertion-ordered finite domains.
//!
//! The entry order is semantic twice over: it fixes the hole-name ordering
//! the enumerator treats as most-significant-first, and each domain's
//! element order is the enumeration order within that hole. Serde preserves
//! entry order in both directions.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::EngineError;

use super::value::Value;

/// Ordered mapping from hole name to its finite, non-empty, ordered domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HoleSpace {
    entries: Vec<(String, Vec<Value>)>,
}

impl HoleSpace {
    pub fn new() -> Self {
        HoleSpace::default()
    }

    /// Build a space from `(name, domain)` pairs in the given order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (String, Vec<Value>)>,
    {
        let mut space = HoleSpace::new();
        for (name, domain) in pairs {
            space.insert(name, domain)?;
        }
        Ok(space)
    }

    /// Insert a domain for `name`, replacing in place if already present.
    /// Empty domains are rejected: every hole must be satisfiable.
    pub fn insert(&mut self, name: impl Into<String>, domain: Vec<Value>) -> Result<(), EngineError> {
        let name = name.into();
        if domain.is_empty() {
            return Err(EngineError::EmptyDomain { hole: name });
        }
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = domain,
            None => self.entries.push((name, domain)),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Hole names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the full cross-product, saturating at `u128::MAX`.
    pub fn product_size(&self) -> u128 {
        self.entries
            .iter()
            .fold(1u128, |acc, (_, d)| acc.saturating_mul(d.len() as u128))
    }
}

impl Serialize for HoleSpace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, domain) in &self.entries {
            map.serialize_entry(name, domain)?;
        }
        map.end()
    }
}

struct HoleSpaceVisitor;

impl<'de> Visitor<'de> for HoleSpaceVisitor {
    type Value = HoleSpace;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of hole names to non-empty value lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<HoleSpace, A::Error> {
        let mut space = HoleSpace::new();
        while let Some((name, domain)) = access.next_entry::<String, Vec<Value>>()? {
            space.insert(name, domain).map_err(de::Error::custom)?;
        }
        Ok(space)
    }
}

impl<'de> Deserialize<'de> for HoleSpace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HoleSpaceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let space = HoleSpace::from_pairs([
            ("replicas".to_string(), vec![Value::Int(2), Value::Int(3)]),
            ("env".to_string(), vec![Value::Str("staging".into()), Value::Str("prod".into())]),
        ])
        .unwrap();
        let names: Vec<&str> = space.names().collect();
        assert_eq!(names, vec!["replicas", "env"]);
        assert_eq!(space.product_size(), 4);
    }

    #[test]
    fn empty_domain_is_rejected() {
        let mut space = HoleSpace::new();
        let err = space.insert("env", Vec::new()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyDomain { ref hole } if hole == "env"));
    }

    #[test]
    fn serde_keeps_document_order() {
        let text = r#"{"zeta": [1], "alpha": [2, 3]}"#;
        let space: HoleSpace = serde_json::from_str(text).unwrap();
        let names: Vec<&str> = space.names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        let back = serde_json::to_string(&space).unwrap();
        assert!(back.find("zeta").unwrap() < back.find("alpha").unwrap());
    }

    #[test]
    fn empty_domain_in_document_is_an_error() {
        let result: Result<HoleSpace, _> = serde_json::from_str(r#"{"env": []}"#);
        assert!(result.is_err());
    }
}
