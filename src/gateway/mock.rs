//! In-memory gateway for tests
//!
//! Behaves like a tiny API server: creates collide on name, updates need an
//! existing object, lists filter on `key=value` selectors. Every call is
//! recorded so tests can assert on the exact sequence of side effects.

#![allow(clippy::expect_used)]

use super::{ApiFailure, GatewayError, ResourceGateway};
use crate::crd::DeploymentConfig;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::ReplicationController;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Mutex;

type Key = (String, String);

#[derive(Default)]
struct State {
    deployment_configs: BTreeMap<Key, DeploymentConfig>,
    deployments: BTreeMap<Key, Deployment>,
    replication_controllers: Vec<ReplicationController>,
    replica_sets: BTreeMap<Key, ReplicaSet>,
    calls: Vec<String>,
    next_uid: u64,
    conflict_on_update: bool,
}

#[derive(Default)]
pub struct MockGateway {
    state: Mutex<State>,
}

fn key_of(namespace: Option<String>, name: String) -> Key {
    (namespace.unwrap_or_default(), name)
}

fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels.get(k).map(String::as_str) == Some(v),
            None => labels.contains_key(term),
        })
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("MockGateway lock poisoned")
    }

    pub fn with_deployment_config(self, dc: DeploymentConfig) -> Self {
        let key = key_of(dc.namespace(), dc.name_any());
        self.state().deployment_configs.insert(key, dc);
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let key = key_of(deployment.namespace(), deployment.name_any());
        self.state().deployments.insert(key, deployment);
        self
    }

    pub fn with_replication_controller(self, rc: ReplicationController) -> Self {
        self.state().replication_controllers.push(rc);
        self
    }

    pub fn with_replica_set(self, rs: ReplicaSet) -> Self {
        let key = key_of(rs.namespace(), rs.name_any());
        self.state().replica_sets.insert(key, rs);
        self
    }

    /// Make every DeploymentConfig update fail with a 409 Conflict
    pub fn with_conflict_on_update(self) -> Self {
        self.state().conflict_on_update = true;
        self
    }

    pub fn deployment_config(&self, namespace: &str, name: &str) -> Option<DeploymentConfig> {
        self.state()
            .deployment_configs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state()
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn replica_sets(&self) -> Vec<ReplicaSet> {
        self.state().replica_sets.values().cloned().collect()
    }

    pub fn replication_controllers(&self) -> Vec<ReplicationController> {
        self.state().replication_controllers.clone()
    }

    /// Calls in the order they were made, e.g. `update DeploymentConfig demo/web`
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn assign_uid(state: &mut State, meta: &mut kube::api::ObjectMeta) {
        state.next_uid += 1;
        meta.uid = Some(format!("uid-{}", state.next_uid));
        meta.resource_version = Some("1".to_string());
    }
}

#[async_trait]
impl ResourceGateway for MockGateway {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentConfig, GatewayError> {
        let mut state = self.state();
        state
            .calls
            .push(format!("get DeploymentConfig {namespace}/{name}"));
        state
            .deployment_configs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                GatewayError::new(ApiFailure::NotFound, "DeploymentConfig", namespace, name, "")
            })
    }

    async fn update_deployment_config(
        &self,
        dc: &DeploymentConfig,
    ) -> Result<DeploymentConfig, GatewayError> {
        let mut state = self.state();
        let (namespace, name) = key_of(dc.namespace(), dc.name_any());
        state
            .calls
            .push(format!("update DeploymentConfig {namespace}/{name}"));

        if state.conflict_on_update {
            return Err(GatewayError::new(
                ApiFailure::Conflict,
                "DeploymentConfig",
                &namespace,
                &name,
                "the object has been modified",
            ));
        }

        let key = (namespace.clone(), name.clone());
        if !state.deployment_configs.contains_key(&key) {
            return Err(GatewayError::new(
                ApiFailure::NotFound,
                "DeploymentConfig",
                &namespace,
                &name,
                "",
            ));
        }
        state.deployment_configs.insert(key, dc.clone());
        Ok(dc.clone())
    }

    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, GatewayError> {
        let mut state = self.state();
        let (namespace, name) = key_of(deployment.namespace(), deployment.name_any());
        state
            .calls
            .push(format!("create Deployment {namespace}/{name}"));

        let key = (namespace.clone(), name.clone());
        if state.deployments.contains_key(&key) {
            return Err(GatewayError::new(
                ApiFailure::AlreadyExists,
                "Deployment",
                &namespace,
                &name,
                "",
            ));
        }

        let mut created = deployment.clone();
        Self::assign_uid(&mut state, &mut created.metadata);
        state.deployments.insert(key, created.clone());
        Ok(created)
    }

    async fn list_replication_controllers(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ReplicationController>, GatewayError> {
        let mut state = self.state();
        state
            .calls
            .push(format!("list ReplicationController {namespace} {label_selector}"));
        Ok(state
            .replication_controllers
            .iter()
            .filter(|rc| rc.namespace().as_deref() == Some(namespace))
            .filter(|rc| matches_selector(rc.labels(), label_selector))
            .cloned()
            .collect())
    }

    async fn create_replica_set(&self, rs: &ReplicaSet) -> Result<ReplicaSet, GatewayError> {
        let mut state = self.state();
        let (namespace, name) = key_of(rs.namespace(), rs.name_any());
        state
            .calls
            .push(format!("create ReplicaSet {namespace}/{name}"));

        let key = (namespace.clone(), name.clone());
        if state.replica_sets.contains_key(&key) {
            return Err(GatewayError::new(
                ApiFailure::AlreadyExists,
                "ReplicaSet",
                &namespace,
                &name,
                "",
            ));
        }

        let mut created = rs.clone();
        Self::assign_uid(&mut state, &mut created.metadata);
        state.replica_sets.insert(key, created.clone());
        Ok(created)
    }
}
