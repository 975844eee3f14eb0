use crate::crd::deployment_config::{
    DeploymentConfig, DeploymentStrategy, DeploymentStrategyType, DeploymentTriggerType,
    LifecycleHook,
};
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy as NativeStrategy, RollingUpdateDeployment,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("DeploymentConfig missing {0}")]
    MissingField(&'static str),
}

/// Turns a DeploymentConfig into the Deployment that replaces it
///
/// Injected into the migrator so tests can substitute their own mapping.
pub trait SpecConverter: Send + Sync {
    fn convert(&self, dc: &DeploymentConfig) -> Result<Deployment, ConvertError>;
}

/// The standard DeploymentConfig to Deployment mapping
pub struct DeploymentConverter;

impl SpecConverter for DeploymentConverter {
    fn convert(&self, dc: &DeploymentConfig) -> Result<Deployment, ConvertError> {
        convert_deployment_config(dc)
    }
}

fn describe_hook(stage: &str, hook: &LifecycleHook) -> String {
    let action = if hook.exec_new_pod.is_some() {
        "execNewPod"
    } else if !hook.tag_images.is_empty() {
        "tagImages"
    } else {
        "empty"
    };
    format!("{stage} lifecycle hook ({action}) has no Deployment equivalent")
}

/// Map the legacy strategy onto a native one
///
/// Missing strategy or strategy type means Rolling, as on OpenShift.
/// Deployer-only knobs (update period, polling interval, deployer pod
/// resources and deadline) have no effect on a Deployment and are dropped.
/// Returns the native strategy and the progress deadline derived from it.
fn convert_strategy(
    strategy: Option<&DeploymentStrategy>,
) -> Result<(NativeStrategy, Option<i32>), ConvertError> {
    let default_strategy = DeploymentStrategy::default();
    let strategy = strategy.unwrap_or(&default_strategy);

    match strategy.strategy_type.clone().unwrap_or_default() {
        DeploymentStrategyType::Rolling => {
            let params = strategy.rolling_params.clone().unwrap_or_default();
            if let Some(hook) = &params.pre {
                return Err(ConvertError::UnsupportedStrategy(describe_hook("pre", hook)));
            }
            if let Some(hook) = &params.post {
                return Err(ConvertError::UnsupportedStrategy(describe_hook("post", hook)));
            }

            let has_params = params.max_surge.is_some() || params.max_unavailable.is_some();
            let rolling_update = has_params.then(|| RollingUpdateDeployment {
                max_surge: params.max_surge.clone(),
                max_unavailable: params.max_unavailable.clone(),
            });

            let progress_deadline = params
                .timeout_seconds
                .map(|secs| i32::try_from(secs).unwrap_or(i32::MAX));

            Ok((
                NativeStrategy {
                    type_: Some("RollingUpdate".to_string()),
                    rolling_update,
                },
                progress_deadline,
            ))
        }
        DeploymentStrategyType::Recreate => {
            let params = strategy.recreate_params.clone().unwrap_or_default();
            let hooks = [
                ("pre", &params.pre),
                ("mid", &params.mid),
                ("post", &params.post),
            ];
            for (stage, hook) in hooks {
                if let Some(hook) = hook {
                    return Err(ConvertError::UnsupportedStrategy(describe_hook(stage, hook)));
                }
            }

            Ok((
                NativeStrategy {
                    type_: Some("Recreate".to_string()),
                    rolling_update: None,
                },
                None,
            ))
        }
        DeploymentStrategyType::Custom => Err(ConvertError::UnsupportedStrategy(
            "Custom strategy runs a user-supplied deployer image".to_string(),
        )),
    }
}

/// Convert a DeploymentConfig into a Deployment
///
/// Pure: the result depends only on `dc`. Template, replicas and selector
/// are copied unchanged. Anything without a native equivalent (image change
/// triggers, lifecycle hooks, custom deployers, test mode) fails the whole
/// conversion rather than being dropped. `paused` is left unset; forcing it
/// is the migrator's job.
pub fn convert_deployment_config(dc: &DeploymentConfig) -> Result<Deployment, ConvertError> {
    let name = dc
        .metadata
        .name
        .clone()
        .ok_or(ConvertError::MissingField("metadata.name"))?;

    if dc.spec.test {
        return Err(ConvertError::UnsupportedStrategy(
            "test mode scales the config to zero after each rollout".to_string(),
        ));
    }

    for trigger in &dc.spec.triggers {
        match trigger.trigger_type {
            DeploymentTriggerType::ConfigChange => {}
            DeploymentTriggerType::ImageChange => {
                let from = trigger
                    .image_change_params
                    .as_ref()
                    .and_then(|p| p.from.name.clone())
                    .unwrap_or_default();
                return Err(ConvertError::UnsupportedStrategy(format!(
                    "ImageChange trigger on {from:?} has no Deployment equivalent"
                )));
            }
        }
    }

    let template = dc
        .spec
        .template
        .clone()
        .ok_or(ConvertError::MissingField("spec.template"))?;

    let (strategy, progress_deadline_seconds) = convert_strategy(dc.spec.strategy.as_ref())?;

    let match_labels = if dc.spec.selector.is_empty() {
        None
    } else {
        Some(dc.spec.selector.clone())
    };

    Ok(Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: dc.metadata.namespace.clone(),
            labels: dc.metadata.labels.clone(),
            annotations: dc.metadata.annotations.clone(),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(dc.spec.replicas),
            selector: LabelSelector {
                match_labels,
                ..Default::default()
            },
            template,
            strategy: Some(strategy),
            min_ready_seconds: dc.spec.min_ready_seconds,
            revision_history_limit: dc.spec.revision_history_limit,
            progress_deadline_seconds,
            ..Default::default()
        }),
        status: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Tests can use unwrap/expect for brevity
#[path = "convert_test.rs"]
mod tests;
