use super::convert::{DeploymentConverter, SpecConverter};
use super::error::{MigrationError, MigrationStep};
use super::history::{HistoryMigrator, ReplicaSetHistoryMigrator};
use crate::crd::{DeploymentConfig, DEPLOYMENT_CONFIG_NAME_LABEL};
use crate::gateway::ResourceGateway;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of migrating one DeploymentConfig
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// The DeploymentConfig as stored after pausing
    pub deployment_config: DeploymentConfig,
    /// The paused Deployment as created
    pub deployment: Deployment,
    /// Historical ReplicaSets as created, oldest revision first
    pub history: Vec<ReplicaSet>,
}

/// Drives DeploymentConfig to Deployment migrations
///
/// Built from an injected gateway only. The conversion and history
/// algorithms are capabilities too, so either can be replaced in tests.
pub struct Migrator {
    gateway: Arc<dyn ResourceGateway>,
    converter: Arc<dyn SpecConverter>,
    history: Arc<dyn HistoryMigrator>,
}

/// Set `paused` on a DeploymentConfig
///
/// Returns false when it was already paused, in which case `dc` is untouched.
pub fn pause(dc: &mut DeploymentConfig) -> bool {
    if dc.spec.paused {
        return false;
    }
    dc.spec.paused = true;
    true
}

/// Label selector matching the ReplicationControllers a DeploymentConfig rolled out
pub fn history_selector(deployment_config_name: &str) -> String {
    format!("{DEPLOYMENT_CONFIG_NAME_LABEL}={deployment_config_name}")
}

impl Migrator {
    pub fn new(gateway: Arc<dyn ResourceGateway>) -> Self {
        Migrator {
            gateway,
            converter: Arc::new(DeploymentConverter),
            history: Arc::new(ReplicaSetHistoryMigrator),
        }
    }

    pub fn with_converter(mut self, converter: impl SpecConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn with_history_migrator(mut self, history: impl HistoryMigrator + 'static) -> Self {
        self.history = Arc::new(history);
        self
    }

    /// Migrate every named DeploymentConfig in `namespace`, in order
    ///
    /// Stops at the first failure. Nothing already applied is rolled back,
    /// and names after the failing one are not touched.
    pub async fn run(
        &self,
        namespace: &str,
        names: &[String],
    ) -> Result<Vec<MigrationOutcome>, MigrationError> {
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            outcomes.push(self.migrate(namespace, name).await?);
        }
        Ok(outcomes)
    }

    /// Migrate a single DeploymentConfig
    ///
    /// 1. Fetch the DeploymentConfig
    /// 2. Pause it so the legacy controller stops scaling pods
    /// 3. Convert it to a Deployment
    /// 4. Force the Deployment paused so no rollout starts before history exists
    /// 5. Create the Deployment
    /// 6. List the ReplicationControllers labelled with the config's name
    /// 7. Recreate them as zero-replica ReplicaSets under the Deployment
    pub async fn migrate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<MigrationOutcome, MigrationError> {
        info!(
            namespace = namespace,
            deployment_config = name,
            "Processing deployment config"
        );
        let mut dc = self
            .gateway
            .get_deployment_config(namespace, name)
            .await
            .map_err(MigrationError::at(MigrationStep::Fetch, namespace, name))?;

        info!(
            namespace = namespace,
            deployment_config = name,
            "Pausing deployment config"
        );
        if !pause(&mut dc) {
            debug!(
                namespace = namespace,
                deployment_config = name,
                "Deployment config already paused"
            );
        }
        let dc = self
            .gateway
            .update_deployment_config(&dc)
            .await
            .map_err(MigrationError::at(MigrationStep::Pause, namespace, name))?;

        info!(
            namespace = namespace,
            deployment_config = name,
            "Converting deployment config to deployment"
        );
        let mut deployment = self
            .converter
            .convert(&dc)
            .map_err(MigrationError::at(MigrationStep::Convert, namespace, name))?;

        deployment.metadata.namespace = Some(namespace.to_string());
        deployment.spec.get_or_insert_with(Default::default).paused = Some(true);

        info!(
            namespace = namespace,
            deployment = ?deployment.metadata.name,
            "Creating paused deployment"
        );
        let deployment = self
            .gateway
            .create_deployment(&deployment)
            .await
            .map_err(MigrationError::at(MigrationStep::CreateDeployment, namespace, name))?;

        let selector = history_selector(name);
        let snapshots = self
            .gateway
            .list_replication_controllers(namespace, &selector)
            .await
            .map_err(MigrationError::at(MigrationStep::ListHistory, namespace, name))?;

        if snapshots.is_empty() {
            info!(
                namespace = namespace,
                deployment_config = name,
                "No replication controllers found, nothing to migrate"
            );
        } else {
            info!(
                namespace = namespace,
                deployment_config = name,
                count = snapshots.len(),
                "Found replication controllers managed by deployment config"
            );
            for rc in &snapshots {
                info!(
                    replicationcontroller = ?rc.metadata.name,
                    "Found replication controller"
                );
            }
        }

        let history = self
            .history
            .migrate_history(self.gateway.as_ref(), &deployment, &snapshots)
            .await
            .map_err(MigrationError::at(MigrationStep::MigrateHistory, namespace, name))?;

        info!(
            namespace = namespace,
            deployment_config = name,
            revisions = history.len(),
            "Deployment config migrated; deployment left paused"
        );

        Ok(MigrationOutcome {
            deployment_config: dc,
            deployment,
            history,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Tests can use unwrap/expect for brevity
#[path = "orchestrator_test.rs"]
mod tests;
