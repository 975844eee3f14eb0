use super::convert::ConvertError;
use super::history::HistoryError;
use crate::gateway::{ApiFailure, GatewayError};
use std::fmt;
use thiserror::Error;

/// Steps a single DeploymentConfig migration goes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    Fetch,
    Pause,
    Convert,
    CreateDeployment,
    ListHistory,
    MigrateHistory,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            MigrationStep::Fetch => "fetching deployment config",
            MigrationStep::Pause => "pausing deployment config",
            MigrationStep::Convert => "converting deployment config",
            MigrationStep::CreateDeployment => "creating paused deployment",
            MigrationStep::ListHistory => "listing replication controllers",
            MigrationStep::MigrateHistory => "migrating revision history",
        };
        f.write_str(step)
    }
}

/// What went wrong, independent of where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Conflict,
    UnsupportedStrategy,
    Transport,
    ValidationError,
}

#[derive(Debug, Error)]
pub enum MigrationCause {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// A failed migration of one DeploymentConfig
///
/// Carries enough to resume by hand: which config, which step, and the
/// underlying cause. Side effects of earlier steps are left in place.
#[derive(Debug, Error)]
#[error("{step} {namespace}/{name}: {cause}")]
pub struct MigrationError {
    pub step: MigrationStep,
    pub namespace: String,
    pub name: String,
    #[source]
    pub cause: MigrationCause,
}

impl MigrationError {
    pub fn new(
        step: MigrationStep,
        namespace: &str,
        name: &str,
        cause: impl Into<MigrationCause>,
    ) -> Self {
        MigrationError {
            step,
            namespace: namespace.to_string(),
            name: name.to_string(),
            cause: cause.into(),
        }
    }

    /// Error constructor for `map_err` at a given step
    pub fn at<'a, E>(
        step: MigrationStep,
        namespace: &'a str,
        name: &'a str,
    ) -> impl FnOnce(E) -> MigrationError + 'a
    where
        E: Into<MigrationCause>,
    {
        move |cause| MigrationError::new(step, namespace, name, cause)
    }

    pub fn kind(&self) -> ErrorKind {
        let gateway_kind = |err: &GatewayError| match err.failure() {
            ApiFailure::NotFound => ErrorKind::NotFound,
            ApiFailure::AlreadyExists => ErrorKind::AlreadyExists,
            ApiFailure::Conflict => ErrorKind::Conflict,
            ApiFailure::Validation => ErrorKind::ValidationError,
            ApiFailure::Transport => ErrorKind::Transport,
        };

        match &self.cause {
            MigrationCause::Gateway(err) => gateway_kind(err),
            MigrationCause::Convert(ConvertError::UnsupportedStrategy(_)) => {
                ErrorKind::UnsupportedStrategy
            }
            MigrationCause::Convert(ConvertError::MissingField(_)) => ErrorKind::ValidationError,
            MigrationCause::History(HistoryError::Gateway(err)) => gateway_kind(err),
            MigrationCause::History(_) => ErrorKind::ValidationError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_step_and_resource() {
        let err = MigrationError::new(
            MigrationStep::CreateDeployment,
            "demo",
            "web",
            GatewayError::new(ApiFailure::AlreadyExists, "Deployment", "demo", "web", ""),
        );

        assert_eq!(
            err.to_string(),
            "creating paused deployment demo/web: Deployment demo/web already exists"
        );
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_kind_maps_conversion_failures() {
        let unsupported = MigrationError::new(
            MigrationStep::Convert,
            "demo",
            "web",
            ConvertError::UnsupportedStrategy("Custom".to_string()),
        );
        let missing = MigrationError::new(
            MigrationStep::Convert,
            "demo",
            "web",
            ConvertError::MissingField("spec.template"),
        );

        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedStrategy);
        assert_eq!(missing.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_kind_looks_through_history_errors() {
        let err = MigrationError::new(
            MigrationStep::MigrateHistory,
            "demo",
            "web",
            HistoryError::Gateway(GatewayError::new(
                ApiFailure::Transport,
                "ReplicaSet",
                "demo",
                "web-abc",
                "connection reset",
            )),
        );

        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
