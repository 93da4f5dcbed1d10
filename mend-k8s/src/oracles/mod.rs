//! Concrete oracles over Kubernetes manifests.
//!
//! Each oracle is deterministic and total: internal failures surface as a
//! violation with the `oracle.internal` code and empty evidence, never as
//! a panic or error. Evidence names the conventional hole names repairs
//! use for the field in question (`replicas`, `env`, `run_as_non_root`,
//! `privileged`, `cpu_limit`, `memory_limit`), so the extractor can turn
//! it into constraints whenever the active template covers those holes.

pub mod replicas;
pub mod resources;
pub mod schema;
pub mod security;

pub use replicas::ReplicaPolicyOracle;
pub use resources::ResourceLimitOracle;
pub use schema::SchemaOracle;
pub use security::SecurityContextOracle;

use mend_core::config::PolicyConfig;
use mend_core::traits::Oracle;

use crate::manifest::Manifest;

/// The standard oracle sequence, in verification order.
pub fn standard_oracles(policy: &PolicyConfig) -> Vec<Box<dyn Oracle<Manifest>>> {
    vec![
        Box::new(SchemaOracle::new()),
        Box::new(ReplicaPolicyOracle::from_config(policy)),
        Box::new(SecurityContextOracle::from_config(policy)),
        Box::new(ResourceLimitOracle::from_config(policy)),
    ]
}
