use service_core::error::AppError;
use thiserror::Error;

use crate::models::Stage;
use crate::services::credentials::GenerationError;
use crate::services::gateway::GatewayError;
use crate::utils::RequestError;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Validation(#[from] RequestError),

    #[error("Failed to connect to server: {0}")]
    Connection(#[source] GatewayError),

    #[error("Step '{step}' failed during {stage}: {source}")]
    Command {
        stage: Stage,
        step: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to generate credential: {0}")]
    Generation(#[from] GenerationError),
}

/// Coarse failure category, stable for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    Command,
    Generation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Connection => "connection",
            ErrorKind::Command => "command",
            ErrorKind::Generation => "generation",
        }
    }
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Validation(_) => ErrorKind::Validation,
            ProvisionError::Connection(_) => ErrorKind::Connection,
            ProvisionError::Command { .. } => ErrorKind::Command,
            ProvisionError::Generation(_) => ErrorKind::Generation,
        }
    }

    /// Stage a remote step failed in, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProvisionError::Command { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Validation(RequestError::Invalid(errors)) => {
                AppError::ValidationError(errors)
            }
            ProvisionError::Validation(other) => AppError::BadRequest(anyhow::anyhow!(other)),
            other => AppError::ProvisioningFailed(anyhow::Error::new(other)),
        }
    }
}
