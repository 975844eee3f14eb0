use anyhow::Context as _;
use clap::Parser;
use dc_migrate::config::MigrateOptions;
use dc_migrate::gateway::KubeGateway;
use dc_migrate::migrate::Migrator;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Migrate OpenShift deployment configs to Kubernetes deployments
///
/// Each config is paused, a paused Deployment is created from it, and its
/// replication controllers are copied over as rollout history. Resume the
/// Deployment once you are happy with it.
#[derive(Parser, Debug)]
#[command(name = "migrate-to-deployment", version)]
#[command(override_usage = "migrate-to-deployment [OPTIONS] dc/foo dc/bar ...")]
struct Cli {
    /// Namespace to use (default: current namespace of the kubeconfig context)
    #[arg(short, long, env = "MIGRATE_NAMESPACE")]
    namespace: Option<String>,

    /// Path to the kubeconfig file (default: $KUBECONFIG, ~/.kube/config or in-cluster)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Deployment configs to migrate, as `name` or `dc/name`
    #[arg(required = true, value_name = "DEPLOYMENTCONFIG")]
    names: Vec<String>,
}

/// Load client configuration from an explicit kubeconfig, or infer it
async fn load_config(kubeconfig: Option<&Path>) -> anyhow::Result<Config> {
    match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("reading kubeconfig {}", path.display()))?;
            Ok(Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?)
        }
        None => Ok(Config::infer().await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.kubeconfig.as_deref()).await?;
    let namespace = cli
        .namespace
        .unwrap_or_else(|| config.default_namespace.clone());
    let options = MigrateOptions::new(namespace, &cli.names)?;

    let client = match Client::try_from(config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create Kubernetes client");
            return Err(e.into());
        }
    };

    info!(
        namespace = %options.namespace,
        count = options.names.len(),
        "Migrating deployment configs"
    );

    let migrator = Migrator::new(Arc::new(KubeGateway::new(client)));
    match migrator.run(&options.namespace, &options.names).await {
        Ok(outcomes) => {
            for outcome in &outcomes {
                info!(
                    deployment = ?outcome.deployment.metadata.name,
                    revisions = outcome.history.len(),
                    "Deployment created paused; resume with `kubectl rollout resume`"
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(
                step = %e.step,
                namespace = %e.namespace,
                deployment_config = %e.name,
                kind = ?e.kind(),
                "Migration failed; changes made so far are left in place"
            );
            Err(e.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[path = "main_test.rs"]
mod tests;
