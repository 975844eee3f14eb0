//! OpenShift resource types that have no counterpart in k8s-openapi

pub mod deployment_config;

pub use deployment_config::{
    DeploymentConfig, DeploymentConfigSpec, DeploymentConfigStatus,
    DEPLOYMENT_CONFIG_NAME_LABEL, DEPLOYMENT_CONFIG_VERSION_ANNOTATION,
};
