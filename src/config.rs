//! Run configuration for the migration command

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("deployment config name(s) must be specified")]
    NoNames,

    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("empty deployment config name in {0:?}")]
    EmptyName(String),

    #[error("{arg:?} refers to a {kind}, only deployment configs can be migrated")]
    UnsupportedKind { arg: String, kind: String },
}

/// Resource prefixes `oc` accepts for DeploymentConfigs
const DEPLOYMENT_CONFIG_KINDS: &[&str] = &[
    "dc",
    "deploymentconfig",
    "deploymentconfigs",
    "deploymentconfig.apps.openshift.io",
    "deploymentconfigs.apps.openshift.io",
];

/// Strip an optional `dc/`-style prefix from a command line name
pub fn parse_deployment_config_name(arg: &str) -> Result<String, ConfigError> {
    let name = match arg.split_once('/') {
        Some((kind, name)) => {
            let kind = kind.to_ascii_lowercase();
            if !DEPLOYMENT_CONFIG_KINDS.contains(&kind.as_str()) {
                return Err(ConfigError::UnsupportedKind {
                    arg: arg.to_string(),
                    kind,
                });
            }
            name
        }
        None => arg,
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyName(arg.to_string()));
    }
    Ok(name.to_string())
}

/// Validated input for one run: a namespace and the configs to migrate in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateOptions {
    pub namespace: String,
    pub names: Vec<String>,
}

impl MigrateOptions {
    pub fn new(namespace: impl Into<String>, args: &[String]) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if args.is_empty() {
            return Err(ConfigError::NoNames);
        }

        let names = args
            .iter()
            .map(|arg| parse_deployment_config_name(arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MigrateOptions { namespace, names })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[path = "config_test.rs"]
mod tests;
