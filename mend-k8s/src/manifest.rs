//! The artifact: a Kubernetes manifest held as a YAML document.
//!
//! The engine treats this as opaque; only the executor and the oracles
//! look inside. Dotted-path accessors cover the read side (numeric
//! segments index into sequences).

use std::path::Path;

use serde_yaml::Value as Yaml;

use mend_core::errors::ManifestError;

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: Yaml,
}

impl Manifest {
    pub fn from_yaml(doc: Yaml) -> Self {
        Manifest { doc }
    }

    pub fn from_str(text: &str) -> Result<Self, ManifestError> {
        let doc = serde_yaml::from_str(text).map_err(|e| ManifestError::Parse {
            message: e.to_string(),
        })?;
        Ok(Manifest { doc })
    }

    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(&self.doc).map_err(|e| ManifestError::Serialize {
            message: e.to_string(),
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        let text = self.to_yaml_string()?;
        std::fs::write(path, text).map_err(|e| ManifestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn doc(&self) -> &Yaml {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Yaml {
        &mut self.doc
    }

    /// Resolve a dotted path like `spec.template.spec.containers.0.image`.
    pub fn get(&self, dotted: &str) -> Option<&Yaml> {
        let mut node = &self.doc;
        for segment in dotted.split('.') {
            node = match node {
                Yaml::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => node.get(segment)?,
            };
        }
        Some(node)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Yaml::as_str)
    }

    pub fn get_i64(&self, dotted: &str) -> Option<i64> {
        self.get(dotted).and_then(Yaml::as_i64)
    }

    pub fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.get(dotted).and_then(Yaml::as_bool)
    }

    pub fn kind(&self) -> Option<&str> {
        self.get_str("kind")
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("metadata.name")
    }

    /// The container list for workload and pod shapes, wherever it lives.
    pub fn containers(&self) -> Option<&Vec<Yaml>> {
        self.get("spec.template.spec.containers")
            .or_else(|| self.get("spec.containers"))
            .and_then(Yaml::as_sequence)
    }
}
