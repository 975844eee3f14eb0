//! DeploymentConfig to Deployment migration
//!
//! - `convert`: pure spec mapping between the two rollout models
//! - `history`: rebuilds revision history as zero-replica ReplicaSets
//! - `orchestrator`: the per-config workflow tying both to the gateway

pub mod convert;
pub mod error;
pub mod history;
pub mod orchestrator;

pub use convert::*;
pub use error::*;
pub use history::*;
pub use orchestrator::*;
