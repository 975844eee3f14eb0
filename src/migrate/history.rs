use crate::crd::DEPLOYMENT_CONFIG_VERSION_ANNOTATION;
use crate::gateway::{GatewayError, ResourceGateway};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, ReplicaSetSpec};
use k8s_openapi::api::core::v1::{PodTemplateSpec, ReplicationController};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::ResourceExt;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Label the Deployment controller uses to tell its ReplicaSets apart
pub const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";

/// Annotation holding a ReplicaSet's revision within its Deployment
pub const REVISION_ANNOTATION: &str = "deployment.kubernetes.io/revision";

/// Annotation recording which ReplicationController a ReplicaSet was migrated from
pub const MIGRATED_FROM_ANNOTATION: &str = "apps.openshift.io/migrated-from";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("target Deployment missing {0}")]
    MissingTargetField(&'static str),

    #[error("ReplicationController {0} has no pod template")]
    MissingTemplate(String),

    #[error("Failed to serialize PodTemplateSpec: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Recreates a DeploymentConfig's revision history under a Deployment
#[async_trait]
pub trait HistoryMigrator: Send + Sync {
    /// Create one ReplicaSet per snapshot and return them in revision order
    async fn migrate_history(
        &self,
        gateway: &dyn ResourceGateway,
        target: &Deployment,
        snapshots: &[ReplicationController],
    ) -> Result<Vec<ReplicaSet>, HistoryError>;
}

/// Migrates history into zero-replica ReplicaSets owned by the target
pub struct ReplicaSetHistoryMigrator;

#[async_trait]
impl HistoryMigrator for ReplicaSetHistoryMigrator {
    async fn migrate_history(
        &self,
        gateway: &dyn ResourceGateway,
        target: &Deployment,
        snapshots: &[ReplicationController],
    ) -> Result<Vec<ReplicaSet>, HistoryError> {
        let artifacts = build_revision_history(target, snapshots)?;

        let mut created = Vec::with_capacity(artifacts.len());
        for rs in &artifacts {
            info!(
                deployment = ?target.metadata.name,
                replicaset = ?rs.metadata.name,
                revision = ?rs.annotations().get(REVISION_ANNOTATION),
                migrated_from = ?rs.annotations().get(MIGRATED_FROM_ANNOTATION),
                "Creating historical ReplicaSet"
            );
            created.push(gateway.create_replica_set(rs).await?);
        }

        Ok(created)
    }
}

/// Compute a stable 10-character hash for a PodTemplateSpec
///
/// FNV-1a over the template's JSON, deterministic across processes. A
/// non-zero `collision_count` is folded in afterwards so identical
/// templates can still get distinct names, the same way the Deployment
/// controller resolves ReplicaSet name collisions.
pub fn compute_pod_template_hash(
    template: &PodTemplateSpec,
    collision_count: u32,
) -> Result<String, HistoryError> {
    let json = serde_json::to_string(template)
        .map_err(|e| HistoryError::SerializationError(e.to_string()))?;

    let mut hash: u64 = 0xcbf29ce484222325;
    let mut feed = |bytes: &[u8]| {
        for byte in bytes {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
    };
    feed(json.as_bytes());
    if collision_count > 0 {
        feed(&collision_count.to_le_bytes());
    }

    Ok(format!("{hash:016x}")[..10].to_string())
}

/// Legacy revision of a snapshot
///
/// Read from the deployment-config version annotation, falling back to the
/// `-<N>` suffix OpenShift gives ReplicationController names, then to 0.
pub fn legacy_revision(rc: &ReplicationController) -> i64 {
    rc.annotations()
        .get(DEPLOYMENT_CONFIG_VERSION_ANNOTATION)
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| {
            rc.metadata
                .name
                .as_deref()
                .and_then(|name| name.rsplit_once('-'))
                .and_then(|(_, suffix)| suffix.parse().ok())
        })
        .unwrap_or(0)
}

/// Total order over snapshots: legacy revision, then creation time (oldest
/// first, unknown before known), then name
pub fn snapshot_order(a: &ReplicationController, b: &ReplicationController) -> Ordering {
    let created_at = |rc: &ReplicationController| {
        rc.metadata.creation_timestamp.as_ref().map(|t| t.0)
    };

    legacy_revision(a)
        .cmp(&legacy_revision(b))
        .then_with(|| created_at(a).cmp(&created_at(b)))
        .then_with(|| a.metadata.name.cmp(&b.metadata.name))
}

/// Build the ReplicaSets that carry `snapshots` as history of `target`
///
/// Pure: nothing is created. Output is in revision order with revisions
/// numbered 1..=N regardless of the legacy numbering. Every ReplicaSet:
/// - keeps the pod template of its snapshot, not the target's
/// - runs zero replicas
/// - is named `{deployment}-{pod-template-hash}` and selected by the
///   target's selector plus the hash label
/// - is controlled by `target`, which must therefore carry a uid
pub fn build_revision_history(
    target: &Deployment,
    snapshots: &[ReplicationController],
) -> Result<Vec<ReplicaSet>, HistoryError> {
    if snapshots.is_empty() {
        return Ok(Vec::new());
    }

    let deployment_name = target
        .metadata
        .name
        .clone()
        .ok_or(HistoryError::MissingTargetField("metadata.name"))?;
    let namespace = target.metadata.namespace.clone();
    let uid = target
        .metadata
        .uid
        .clone()
        .ok_or(HistoryError::MissingTargetField("metadata.uid"))?;
    let target_spec = target
        .spec
        .as_ref()
        .ok_or(HistoryError::MissingTargetField("spec"))?;

    let owner = OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        name: deployment_name.clone(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    };

    let mut ordered: Vec<&ReplicationController> = snapshots.iter().collect();
    ordered.sort_by(|a, b| snapshot_order(a, b));

    let mut used_names = HashSet::new();
    let mut artifacts = Vec::with_capacity(ordered.len());

    for (index, rc) in ordered.into_iter().enumerate() {
        let revision = index + 1;
        let rc_name = rc.name_any();
        let mut template = rc
            .spec
            .as_ref()
            .and_then(|s| s.template.clone())
            .ok_or_else(|| HistoryError::MissingTemplate(rc_name.clone()))?;

        let mut collision_count = 0;
        let (hash, rs_name) = loop {
            let hash = compute_pod_template_hash(&template, collision_count)?;
            let rs_name = format!("{deployment_name}-{hash}");
            if used_names.insert(rs_name.clone()) {
                break (hash, rs_name);
            }
            collision_count += 1;
        };

        debug!(
            replicationcontroller = %rc_name,
            legacy_revision = legacy_revision(rc),
            revision = revision,
            replicaset = %rs_name,
            "Mapped revision snapshot"
        );

        let mut labels = template
            .metadata
            .as_ref()
            .and_then(|m| m.labels.clone())
            .unwrap_or_default();
        labels.insert(POD_TEMPLATE_HASH_LABEL.to_string(), hash.clone());

        let mut template_metadata = template.metadata.take().unwrap_or_default();
        template_metadata.labels = Some(labels.clone());
        template.metadata = Some(template_metadata);

        let mut selector = target_spec.selector.clone();
        selector
            .match_labels
            .get_or_insert_with(BTreeMap::new)
            .insert(POD_TEMPLATE_HASH_LABEL.to_string(), hash);

        let annotations = BTreeMap::from([
            (REVISION_ANNOTATION.to_string(), revision.to_string()),
            (MIGRATED_FROM_ANNOTATION.to_string(), rc_name),
        ]);

        artifacts.push(ReplicaSet {
            metadata: ObjectMeta {
                name: Some(rs_name),
                namespace: namespace.clone(),
                labels: Some(labels),
                annotations: Some(annotations),
                owner_references: Some(vec![owner.clone()]),
                ..Default::default()
            },
            spec: Some(ReplicaSetSpec {
                replicas: Some(0),
                min_ready_seconds: target_spec.min_ready_seconds,
                selector,
                template: Some(template),
            }),
            status: None,
        });
    }

    Ok(artifacts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Tests can use unwrap/expect for brevity
#[path = "history_test.rs"]
mod tests;
