use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Message returned to callers for any provisioning failure past validation.
pub const PROVISIONING_FAILED_MESSAGE: &str = "Failed to configure VPN";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Body a transport layer sends back for an [`AppError`].
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ProvisioningFailed(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing body. Failures after validation are collapsed into one
    /// opaque message; the full chain only goes to the logs.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            AppError::ValidationError(err) => ErrorResponse {
                error: "Validation error".to_string(),
                details: Some(err.to_string()),
            },
            AppError::BadRequest(err) => ErrorResponse {
                error: err.to_string(),
                details: None,
            },
            AppError::ProvisioningFailed(err) => {
                tracing::error!(error = %err, "Provisioning failed");
                ErrorResponse {
                    error: PROVISIONING_FAILED_MESSAGE.to_string(),
                    details: None,
                }
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal error");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                ErrorResponse {
                    error: "Configuration error".to_string(),
                    details: None,
                }
            }
        }
    }
}
