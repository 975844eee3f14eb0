use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label OpenShift puts on every ReplicationController a DeploymentConfig owns
pub const DEPLOYMENT_CONFIG_NAME_LABEL: &str = "openshift.io/deployment-config.name";

/// Annotation carrying the DeploymentConfig revision a ReplicationController rolled out
pub const DEPLOYMENT_CONFIG_VERSION_ANNOTATION: &str =
    "openshift.io/deployment-config.latest-version";

/// DeploymentConfig is the OpenShift rollout controller being migrated away from
///
/// Every `spec` field is modelled so a fetched object can be written back
/// with a replace without losing fields.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    namespaced,
    status = "DeploymentConfigStatus",
    shortname = "dc"
)]
pub struct DeploymentConfigSpec {
    /// Desired number of pods
    #[serde(default)]
    pub replicas: i32,

    /// Plain label selector (OpenShift does not support match expressions here)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,

    /// Pod template rolled out by the deployer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    /// When true the legacy controller stops acting on this config
    #[serde(default)]
    pub paused: bool,

    /// Test configs scale back to zero once a rollout completes
    #[serde(default)]
    pub test: bool,

    #[serde(rename = "minReadySeconds", skip_serializing_if = "Option::is_none")]
    pub min_ready_seconds: Option<i32>,

    #[serde(
        rename = "revisionHistoryLimit",
        skip_serializing_if = "Option::is_none"
    )]
    pub revision_history_limit: Option<i32>,

    /// Events that start a new rollout
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DeploymentTriggerPolicy>,

    /// How a new revision replaces the old one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DeploymentStrategy>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
pub struct DeploymentConfigStatus {
    #[serde(rename = "latestVersion", skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<i64>,

    #[serde(
        rename = "observedGeneration",
        skip_serializing_if = "Option::is_none"
    )]
    pub observed_generation: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(rename = "readyReplicas", skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub enum DeploymentTriggerType {
    ConfigChange,
    ImageChange,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
pub struct DeploymentTriggerPolicy {
    #[serde(rename = "type")]
    pub trigger_type: DeploymentTriggerType,

    #[serde(
        rename = "imageChangeParams",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_change_params: Option<ImageChangeParams>,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
pub struct ImageChangeParams {
    #[serde(default)]
    pub automatic: bool,

    #[serde(rename = "containerNames", default)]
    pub container_names: Vec<String>,

    /// Image stream tag the trigger watches
    pub from: ObjectReference,

    #[serde(rename = "lastTriggeredImage", skip_serializing_if = "Option::is_none")]
    pub last_triggered_image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum DeploymentStrategyType {
    #[default]
    Rolling,
    Recreate,
    Custom,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
pub struct DeploymentStrategy {
    /// Defaults to Rolling when unset
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<DeploymentStrategyType>,

    #[serde(rename = "rollingParams", skip_serializing_if = "Option::is_none")]
    pub rolling_params: Option<RollingDeploymentStrategyParams>,

    #[serde(rename = "recreateParams", skip_serializing_if = "Option::is_none")]
    pub recreate_params: Option<RecreateDeploymentStrategyParams>,

    /// Custom deployer image parameters, kept opaque
    #[serde(rename = "customParams", skip_serializing_if = "Option::is_none")]
    pub custom_params: Option<serde_json::Value>,

    #[serde(
        rename = "activeDeadlineSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_deadline_seconds: Option<i64>,

    /// Resources for the deployer pod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Labels for the deployer pod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    /// Annotations for the deployer pod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
pub struct RollingDeploymentStrategyParams {
    #[serde(rename = "maxSurge", skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<IntOrString>,

    #[serde(rename = "maxUnavailable", skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<IntOrString>,

    /// Seconds to wait for a rollout to make progress before giving up
    #[serde(rename = "timeoutSeconds", skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,

    #[serde(
        rename = "updatePeriodSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub update_period_seconds: Option<i64>,

    #[serde(rename = "intervalSeconds", skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<LifecycleHook>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<LifecycleHook>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
pub struct RecreateDeploymentStrategyParams {
    #[serde(rename = "timeoutSeconds", skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<LifecycleHook>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid: Option<LifecycleHook>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<LifecycleHook>,
}

/// Deployer hook run around a rollout
///
/// Deployments have no equivalent, so the contents only matter for error messages.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
pub struct LifecycleHook {
    #[serde(rename = "failurePolicy", default)]
    pub failure_policy: String,

    #[serde(rename = "execNewPod", skip_serializing_if = "Option::is_none")]
    pub exec_new_pod: Option<serde_json::Value>,

    #[serde(rename = "tagImages", default, skip_serializing_if = "Vec::is_empty")]
    pub tag_images: Vec<serde_json::Value>,
}

#[cfg(test)]
#[path = "deployment_config_test.rs"]
mod tests;
