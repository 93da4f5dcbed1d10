//! # mend-k8s
//!
//! Kubernetes manifest domain for the Mend repair engine: the artifact
//! type, the YAML patch executor, the concrete oracles, the default
//! template catalog, and the remote proposer client.

pub mod executor;
pub mod fallback;
pub mod manifest;
pub mod oracles;
pub mod proposer;

pub use executor::K8sPatchExecutor;
pub use fallback::DefaultTemplateCatalog;
pub use manifest::Manifest;
pub use oracles::{
    standard_oracles, ReplicaPolicyOracle, ResourceLimitOracle, SchemaOracle,
    SecurityContextOracle,
};
pub use proposer::HttpProposer;
