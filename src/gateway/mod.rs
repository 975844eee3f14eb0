//! Read/write access to the cluster resources a migration touches
//!
//! The migration only ever goes through [`ResourceGateway`], so the
//! orchestrator can be exercised against an in-memory implementation in
//! tests and against the API server in production ([`KubeGateway`]).

mod cluster;
#[cfg(test)]
pub mod mock;

pub use cluster::KubeGateway;

use crate::crd::DeploymentConfig;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::ReplicationController;
use thiserror::Error;

/// Failure classes a gateway call can end in
///
/// Every variant names the resource it was about so the orchestrator can
/// report it without extra bookkeeping.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} was modified concurrently: {message}")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
        message: String,
    },

    #[error("{kind} {namespace}/{name} rejected by the API server: {message}")]
    Validation {
        kind: &'static str,
        namespace: String,
        name: String,
        message: String,
    },

    #[error("request for {kind} {namespace}/{name} failed: {message}")]
    Transport {
        kind: &'static str,
        namespace: String,
        name: String,
        message: String,
    },
}

/// Coarse classification of an API server response, independent of the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFailure {
    NotFound,
    AlreadyExists,
    Conflict,
    Validation,
    Transport,
}

/// Map an API status code and reason to a failure class
///
/// 409 is shared between create collisions (reason `AlreadyExists`) and
/// optimistic-concurrency failures on update (reason `Conflict`).
pub fn classify_api_failure(code: u16, reason: &str) -> ApiFailure {
    match code {
        404 => ApiFailure::NotFound,
        409 if reason == "AlreadyExists" => ApiFailure::AlreadyExists,
        409 => ApiFailure::Conflict,
        400 | 422 => ApiFailure::Validation,
        _ => ApiFailure::Transport,
    }
}

impl GatewayError {
    /// Build the error for `kind namespace/name` from a classified failure
    pub fn new(
        failure: ApiFailure,
        kind: &'static str,
        namespace: &str,
        name: &str,
        message: impl Into<String>,
    ) -> Self {
        let namespace = namespace.to_string();
        let name = name.to_string();
        match failure {
            ApiFailure::NotFound => GatewayError::NotFound {
                kind,
                namespace,
                name,
            },
            ApiFailure::AlreadyExists => GatewayError::AlreadyExists {
                kind,
                namespace,
                name,
            },
            ApiFailure::Conflict => GatewayError::Conflict {
                kind,
                namespace,
                name,
                message: message.into(),
            },
            ApiFailure::Validation => GatewayError::Validation {
                kind,
                namespace,
                name,
                message: message.into(),
            },
            ApiFailure::Transport => GatewayError::Transport {
                kind,
                namespace,
                name,
                message: message.into(),
            },
        }
    }

    pub fn failure(&self) -> ApiFailure {
        match self {
            GatewayError::NotFound { .. } => ApiFailure::NotFound,
            GatewayError::AlreadyExists { .. } => ApiFailure::AlreadyExists,
            GatewayError::Conflict { .. } => ApiFailure::Conflict,
            GatewayError::Validation { .. } => ApiFailure::Validation,
            GatewayError::Transport { .. } => ApiFailure::Transport,
        }
    }
}

/// Resource access needed by a migration
///
/// Objects passed to `update_*`/`create_*` carry their own namespace in
/// metadata. Implementations must not retry; the caller treats every error
/// as final.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentConfig, GatewayError>;

    async fn update_deployment_config(
        &self,
        dc: &DeploymentConfig,
    ) -> Result<DeploymentConfig, GatewayError>;

    async fn create_deployment(&self, deployment: &Deployment)
        -> Result<Deployment, GatewayError>;

    /// List ReplicationControllers matching `label_selector`, in server order
    async fn list_replication_controllers(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ReplicationController>, GatewayError>;

    async fn create_replica_set(&self, rs: &ReplicaSet) -> Result<ReplicaSet, GatewayError>;
}
