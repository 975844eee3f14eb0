//! Migrate OpenShift DeploymentConfigs to Kubernetes Deployments
//!
//! Each config is paused, converted into a paused Deployment, and its
//! ReplicationController history is recreated as zero-replica ReplicaSets
//! so `kubectl rollout history` and `rollout undo` keep working.

pub mod config;
pub mod crd;
pub mod gateway;
pub mod migrate;
