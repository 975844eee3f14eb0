use super::{classify_api_failure, ApiFailure, GatewayError, ResourceGateway};
use crate::crd::DeploymentConfig;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::ReplicationController;
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, error};

/// Gateway backed by the Kubernetes API server
///
/// Updates use replace (PUT) so the server rejects stale resourceVersions
/// with a 409 instead of silently overwriting a concurrent change.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub fn new(client: Client) -> Self {
        KubeGateway { client }
    }
}

/// Translate a client error into a gateway error for `kind namespace/name`
fn gateway_error(
    err: kube::Error,
    kind: &'static str,
    namespace: &str,
    name: &str,
) -> GatewayError {
    let classified = match &err {
        kube::Error::Api(response) => GatewayError::new(
            classify_api_failure(response.code, &response.reason),
            kind,
            namespace,
            name,
            response.message.clone(),
        ),
        other => GatewayError::new(
            ApiFailure::Transport,
            kind,
            namespace,
            name,
            other.to_string(),
        ),
    };

    if classified.failure() == ApiFailure::Transport {
        error!(
            error = ?err,
            kind = kind,
            namespace = namespace,
            name = name,
            "Kubernetes API request failed"
        );
    } else {
        debug!(error = %classified, "Kubernetes API request rejected");
    }

    classified
}

/// Namespace an object to be written must carry
fn object_namespace(
    namespace: Option<String>,
    kind: &'static str,
    name: &str,
) -> Result<String, GatewayError> {
    namespace.ok_or_else(|| {
        GatewayError::new(
            ApiFailure::Validation,
            kind,
            "",
            name,
            "object has no namespace",
        )
    })
}

#[async_trait]
impl ResourceGateway for KubeGateway {
    async fn get_deployment_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentConfig, GatewayError> {
        let api: Api<DeploymentConfig> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| gateway_error(e, "DeploymentConfig", namespace, name))
    }

    async fn update_deployment_config(
        &self,
        dc: &DeploymentConfig,
    ) -> Result<DeploymentConfig, GatewayError> {
        let name = dc.name_any();
        let namespace = object_namespace(dc.namespace(), "DeploymentConfig", &name)?;
        let api: Api<DeploymentConfig> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&name, &PostParams::default(), dc)
            .await
            .map_err(|e| gateway_error(e, "DeploymentConfig", &namespace, &name))
    }

    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, GatewayError> {
        let name = deployment.name_any();
        let namespace = object_namespace(deployment.namespace(), "Deployment", &name)?;
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&PostParams::default(), deployment)
            .await
            .map_err(|e| gateway_error(e, "Deployment", &namespace, &name))
    }

    async fn list_replication_controllers(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ReplicationController>, GatewayError> {
        let api: Api<ReplicationController> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| gateway_error(e, "ReplicationController", namespace, label_selector))?;
        Ok(list.items)
    }

    async fn create_replica_set(&self, rs: &ReplicaSet) -> Result<ReplicaSet, GatewayError> {
        let name = rs.name_any();
        let namespace = object_namespace(rs.namespace(), "ReplicaSet", &name)?;
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&PostParams::default(), rs)
            .await
            .map_err(|e| gateway_error(e, "ReplicaSet", &namespace, &name))
    }
}
