//! Repair configuration.
//!
//! An explicit record passed into the controller — there is no global
//! config. Loadable from TOML; every field has a default so an empty file
//! (or no file) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level configuration for one repair run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MendConfig {
    pub budgets: BudgetConfig,
    pub bank: BankConfig,
    pub proposer: ProposerConfig,
    pub policy: PolicyConfig,
}

impl MendConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

/// Synthesis budgets.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum candidates tried in one attempt. Default: 512.
    pub max_candidates: Option<u64>,
    /// Maximum consecutive iterations without a new constraint. Default: 16.
    pub max_iters: Option<u64>,
    /// Wall-clock budget in seconds. Default: 30.
    pub timeout_secs: Option<u64>,
}

impl BudgetConfig {
    pub fn effective_max_candidates(&self) -> u64 {
        self.max_candidates.unwrap_or(512)
    }

    pub fn effective_max_iters(&self) -> u64 {
        self.max_iters.unwrap_or(16)
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }
}

/// Repair bank settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BankConfig {
    /// Whether the bank is consulted and updated. Default: true.
    pub enabled: Option<bool>,
    /// Bank file location. Default: `.mend/bank.json`.
    pub path: Option<PathBuf>,
}

impl BankConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(".mend/bank.json"))
    }
}

/// Remote template proposer settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProposerConfig {
    /// Whether the proposer is called on a bank miss. Default: false
    /// (requires an endpoint anyway).
    pub enabled: Option<bool>,
    /// HTTP endpoint accepting the transport document.
    pub endpoint: Option<String>,
    /// Request timeout in seconds. Default: 20.
    pub timeout_secs: Option<u64>,
}

impl ProposerConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(false) && self.endpoint.is_some()
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(20)
    }
}

/// Oracle policy knobs and the domains the default template draws from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Environment label values treated as production.
    pub production_environments: Vec<String>,
    /// Replica window enforced for production workloads. Defaults: 3 and 5.
    pub min_production_replicas: Option<i64>,
    pub max_production_replicas: Option<i64>,
    /// Environments the default template may assign.
    pub environments: Vec<String>,
    /// Replica counts the default template may assign.
    pub replica_domain: Vec<i64>,
    /// Permitted container resource limits.
    pub allowed_cpu_limits: Vec<String>,
    pub allowed_memory_limits: Vec<String>,
    /// Whether containers must declare resource limits. Default: true.
    pub require_resource_limits: Option<bool>,
    /// Whether containers must set runAsNonRoot. Default: true.
    pub require_run_as_non_root: Option<bool>,
}

impl PolicyConfig {
    pub fn effective_production_environments(&self) -> Vec<String> {
        if self.production_environments.is_empty() {
            vec!["prod".to_string(), "production".to_string()]
        } else {
            self.production_environments.clone()
        }
    }

    pub fn effective_min_production_replicas(&self) -> i64 {
        self.min_production_replicas.unwrap_or(3)
    }

    pub fn effective_max_production_replicas(&self) -> i64 {
        self.max_production_replicas.unwrap_or(5)
    }

    pub fn effective_environments(&self) -> Vec<String> {
        if self.environments.is_empty() {
            vec!["dev".to_string(), "staging".to_string(), "prod".to_string()]
        } else {
            self.environments.clone()
        }
    }

    pub fn effective_replica_domain(&self) -> Vec<i64> {
        if self.replica_domain.is_empty() {
            vec![1, 2, 3, 4, 5]
        } else {
            self.replica_domain.clone()
        }
    }

    pub fn effective_allowed_cpu_limits(&self) -> Vec<String> {
        if self.allowed_cpu_limits.is_empty() {
            vec!["250m".to_string(), "500m".to_string(), "1".to_string()]
        } else {
            self.allowed_cpu_limits.clone()
        }
    }

    pub fn effective_allowed_memory_limits(&self) -> Vec<String> {
        if self.allowed_memory_limits.is_empty() {
            vec!["256Mi".to_string(), "512Mi".to_string(), "1Gi".to_string()]
        } else {
            self.allowed_memory_limits.clone()
        }
    }

    pub fn effective_require_resource_limits(&self) -> bool {
        self.require_resource_limits.unwrap_or(true)
    }

    pub fn effective_require_run_as_non_root(&self) -> bool {
        self.require_run_as_non_root.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = MendConfig::from_toml_str("").unwrap();
        assert_eq!(config.budgets.effective_max_candidates(), 512);
        assert!(config.bank.effective_enabled());
        assert!(!config.proposer.effective_enabled());
        assert_eq!(config.policy.effective_min_production_replicas(), 3);
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            [budgets]
            max_candidates = 8
            timeout_secs = 5

            [bank]
            enabled = false

            [proposer]
            enabled = true
            endpoint = "http://localhost:8090/propose"

            [policy]
            production_environments = ["live"]
            replica_domain = [2, 4]
        "#;
        let config = MendConfig::from_toml_str(text).unwrap();
        assert_eq!(config.budgets.effective_max_candidates(), 8);
        assert_eq!(config.budgets.effective_timeout_secs(), 5);
        assert!(!config.bank.effective_enabled());
        assert!(config.proposer.effective_enabled());
        assert_eq!(config.policy.effective_production_environments(), vec!["live"]);
        assert_eq!(config.policy.effective_replica_domain(), vec![2, 4]);
    }

    #[test]
    fn proposer_without_endpoint_is_disabled() {
        let config = MendConfig::from_toml_str("[proposer]\nenabled = true\n").unwrap();
        assert!(!config.proposer.effective_enabled());
    }
}
