//! Entry point for request handlers.

use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ProvisioningConfig;
use crate::dtos::{ProvisionRequest, ProvisionResponse};
use crate::services::credentials::CredentialGenerator;
use crate::services::gateway::{Connector, SshConnector};
use crate::services::orchestrator::Provisioner;

/// Turns a decoded request body into a response body or a boundary error.
/// Safe to share between concurrent handlers.
pub struct ProvisioningService<C = SshConnector> {
    provisioner: Provisioner<C>,
}

impl ProvisioningService<SshConnector> {
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::new(
            SshConnector::new(&config.ssh),
            Arc::new(CredentialGenerator::new()),
            config.ssh.port,
        )
    }

    /// Load configuration, install the tracing subscriber and build the service.
    pub fn bootstrap() -> Result<Self, AppError> {
        let config = ProvisioningConfig::load()?;
        init_tracing(&config.common.service_name, &config.common.log_level);

        info!(
            ssh_port = config.ssh.port,
            connect_timeout_secs = config.ssh.connect_timeout_secs,
            command_timeout_secs = config.ssh.command_timeout_secs,
            "Provisioning service configured"
        );

        Ok(Self::from_config(&config))
    }
}

impl<C: Connector> ProvisioningService<C> {
    pub fn new(connector: C, generator: Arc<CredentialGenerator>, port: u16) -> Self {
        Self {
            provisioner: Provisioner::new(connector, generator, port),
        }
    }

    pub fn provisioner(&self) -> &Provisioner<C> {
        &self.provisioner
    }

    pub async fn handle(&self, request: ProvisionRequest) -> Result<ProvisionResponse, AppError> {
        match self.provisioner.provision(request).await {
            Ok(result) => Ok(result.into()),
            Err(err) => {
                warn!(
                    kind = err.kind().as_str(),
                    stage = err.stage().map(|s| s.as_str()),
                    error = %err,
                    "Provisioning request failed"
                );
                Err(err.into())
            }
        }
    }
}
