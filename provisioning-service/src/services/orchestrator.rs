//! The provisioning pipeline.
//!
//! One run walks `Validating -> Connecting -> InstallingPackages ->
//! ConfiguringVpn -> RotatingCredential -> CleaningUp -> Closed`. Any failure
//! before cleanup ends the run with a typed error; cleanup failures are only
//! logged. Once connected, the session is closed on every path.

use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::dtos::ProvisionRequest;
use crate::models::{ProvisioningRequest, ProvisioningResult, Stage};
use crate::services::credentials::CredentialGenerator;
use crate::services::error::ProvisionError;
use crate::services::gateway::{ConnectTarget, Connector, OutputSink, RemoteSession, TracingSink};
use crate::services::metrics;
use crate::services::strategy::{install_step, run_steps, RemoteStep, Strategy};
use crate::utils::validate_request;

/// Best-effort wipe of transient files, log contents and shell history.
pub fn cleanup_steps() -> Vec<RemoteStep> {
    vec![
        RemoteStep::new("clear temporary files", "rm -rf /tmp/* /var/tmp/*"),
        RemoteStep::new(
            "truncate logs",
            "find /var/log -type f -exec truncate -s 0 {} +",
        ),
        RemoteStep::new(
            "clear shell history",
            "rm -f /root/.bash_history; history -c 2>/dev/null || true",
        ),
    ]
}

fn rotation_step(password: &SecretString) -> RemoteStep {
    RemoteStep::new(
        "rotate root password",
        format!("echo 'root:{}' | chpasswd", password.expose_secret()),
    )
}

pub struct Provisioner<C> {
    connector: C,
    generator: Arc<CredentialGenerator>,
    port: u16,
}

impl<C: Connector> Provisioner<C> {
    pub fn new(connector: C, generator: Arc<CredentialGenerator>, port: u16) -> Self {
        Self {
            connector,
            generator,
            port,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Validate `request` and run the pipeline. Rejected requests never reach
    /// the network.
    pub async fn provision(
        &self,
        request: ProvisionRequest,
    ) -> Result<ProvisioningResult, ProvisionError> {
        let request = timed(Stage::Validating, async move { validate_request(request) }).await?;
        self.execute(&request).await
    }

    #[instrument(
        name = "provision",
        skip_all,
        fields(host = %request.host(), vpn_type = %request.vpn_type())
    )]
    pub async fn execute(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningResult, ProvisionError> {
        let target = ConnectTarget {
            host: request.host(),
            port: self.port,
            username: request.username().to_string(),
            credential: request.credential().clone(),
        };

        let connected = timed(Stage::Connecting, self.connector.connect(&target)).await;
        let session = match connected {
            Ok(session) => session,
            Err(err) => {
                let err = ProvisionError::Connection(err);
                metrics::record_run(request.vpn_type(), err.kind().as_str());
                return Err(err);
            }
        };

        let outcome = self.run_connected(session.as_ref(), request).await;

        if let Err(err) = session.close().await {
            warn!(error = %err, "Failed to close session cleanly");
        }
        info!(stage = Stage::Closed.as_str(), success = outcome.is_ok(), "Session closed");

        let label = match &outcome {
            Ok(_) => "success",
            Err(err) => err.kind().as_str(),
        };
        metrics::record_run(request.vpn_type(), label);

        outcome
    }

    async fn run_connected(
        &self,
        session: &dyn RemoteSession,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningResult, ProvisionError> {
        let vpn_type = request.vpn_type();

        timed(
            Stage::InstallingPackages,
            run_steps(session, Stage::InstallingPackages, &[install_step(vpn_type)]),
        )
        .await?;

        let strategy = Strategy::for_type(vpn_type, Arc::clone(&self.generator));
        let config = timed(
            Stage::ConfiguringVpn,
            strategy.configure(session, request.host()),
        )
        .await?;

        let new_password = timed(Stage::RotatingCredential, self.rotate_credential(session)).await?;

        timed(Stage::CleaningUp, cleanup(session)).await;

        Ok(ProvisioningResult {
            config,
            new_password,
        })
    }

    async fn rotate_credential(
        &self,
        session: &dyn RemoteSession,
    ) -> Result<SecretString, ProvisionError> {
        let password = self.generator.generate_password()?;
        run_steps(
            session,
            Stage::RotatingCredential,
            &[rotation_step(&password)],
        )
        .await?;
        Ok(password)
    }
}

/// Runs every cleanup step even if an earlier one fails. Returns the number of
/// failed steps.
async fn cleanup(session: &dyn RemoteSession) -> usize {
    let sink: Arc<dyn OutputSink> = TracingSink::new(Stage::CleaningUp);
    let mut failures = 0;

    for step in cleanup_steps() {
        if let Err(err) = session.run_command(&step.command, Arc::clone(&sink)).await {
            failures += 1;
            metrics::record_cleanup_failure();
            warn!(step = step.name, error = %err, "Cleanup step failed");
        }
    }

    failures
}

async fn timed<T>(stage: Stage, work: impl Future<Output = T>) -> T {
    info!(stage = stage.as_str(), "Entering stage");
    let started = Instant::now();
    let output = work.await;
    metrics::record_stage(stage, started.elapsed());
    output
}
