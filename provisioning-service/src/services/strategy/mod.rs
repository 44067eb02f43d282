//! VPN configuration strategies.
//!
//! Each strategy runs a fixed, ordered list of [`RemoteStep`]s on an open
//! session and renders the client configuration document. The first failing
//! step aborts the rest; nothing is retried or rolled back.

pub mod certificate;
pub mod tunnel;

use std::net::IpAddr;
use std::sync::Arc;

use crate::models::{Stage, VpnType};
use crate::services::credentials::CredentialGenerator;
use crate::services::error::ProvisionError;
use crate::services::gateway::{OutputSink, RemoteSession, TracingSink};

pub use certificate::CertificateStrategy;
pub use tunnel::TunnelStrategy;

/// One shell command run in its own channel. Every step starts in a fresh
/// shell, so commands use absolute paths or `cd <dir> && ...`.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteStep {
    pub name: &'static str,
    pub command: String,
}

impl RemoteStep {
    pub fn new(name: &'static str, command: impl Into<String>) -> Self {
        Self {
            name,
            command: command.into(),
        }
    }
}

// Commands may carry secrets (credential rotation), so only the name is shown.
impl std::fmt::Debug for RemoteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Package installation for a VPN flavour, run before the strategy itself.
pub fn install_step(vpn_type: VpnType) -> RemoteStep {
    let packages = match vpn_type {
        VpnType::Tunnel => "openvpn easy-rsa fail2ban ufw",
        VpnType::Certificate => "strongswan strongswan-pki libcharon-extra-plugins fail2ban ufw",
    };

    RemoteStep::new(
        "install packages",
        format!("apt-get update && DEBIAN_FRONTEND=noninteractive apt-get install -y {packages}"),
    )
}

pub enum Strategy {
    Tunnel(TunnelStrategy),
    Certificate(CertificateStrategy),
}

impl Strategy {
    pub fn for_type(vpn_type: VpnType, generator: Arc<CredentialGenerator>) -> Self {
        match vpn_type {
            VpnType::Tunnel => Strategy::Tunnel(TunnelStrategy),
            VpnType::Certificate => Strategy::Certificate(CertificateStrategy::new(generator)),
        }
    }

    pub fn vpn_type(&self) -> VpnType {
        match self {
            Strategy::Tunnel(_) => VpnType::Tunnel,
            Strategy::Certificate(_) => VpnType::Certificate,
        }
    }

    /// Run every step for this flavour and return the client configuration.
    pub async fn configure(
        &self,
        session: &dyn RemoteSession,
        host: IpAddr,
    ) -> Result<String, ProvisionError> {
        match self {
            Strategy::Tunnel(strategy) => strategy.configure(session, host).await,
            Strategy::Certificate(strategy) => strategy.configure(session, host).await,
        }
    }
}

/// Run `steps` in order, stopping at the first failure.
pub async fn run_steps(
    session: &dyn RemoteSession,
    stage: Stage,
    steps: &[RemoteStep],
) -> Result<(), ProvisionError> {
    let sink: Arc<dyn OutputSink> = TracingSink::new(stage);

    for step in steps {
        tracing::info!(stage = stage.as_str(), step = step.name, "Running remote step");
        session
            .run_command(&step.command, Arc::clone(&sink))
            .await
            .map_err(|source| ProvisionError::Command {
                stage,
                step: step.name,
                source,
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthCredential;
    use crate::services::gateway::{ConnectTarget, Connector, GatewayError, MockConnector};
    use secrecy::SecretString;

    async fn open(connector: &MockConnector) -> Box<dyn RemoteSession> {
        connector
            .connect(&ConnectTarget {
                host: "192.0.2.10".parse().unwrap(),
                port: 22,
                username: "root".to_string(),
                credential: AuthCredential::Password(SecretString::new("pw".to_string())),
            })
            .await
            .unwrap()
    }

    #[test]
    fn install_step_selects_packages_by_type() {
        let tunnel = install_step(VpnType::Tunnel);
        let certificate = install_step(VpnType::Certificate);

        assert!(tunnel.command.contains("openvpn easy-rsa"));
        assert!(!tunnel.command.contains("strongswan"));
        assert!(certificate.command.contains("strongswan-pki"));
        assert!(certificate.command.starts_with("apt-get update && "));
    }

    #[test]
    fn step_debug_hides_command() {
        let step = RemoteStep::new("rotate root password", "echo 'root:secret' | chpasswd");
        assert!(!format!("{:?}", step).contains("secret"));
    }

    #[tokio::test]
    async fn run_steps_stops_at_first_failure() {
        let connector = MockConnector::fail_when("second");
        let session = open(&connector).await;
        let steps = [
            RemoteStep::new("one", "first"),
            RemoteStep::new("two", "second"),
            RemoteStep::new("three", "third"),
        ];

        let err = run_steps(session.as_ref(), Stage::ConfiguringVpn, &steps)
            .await
            .unwrap_err();

        match err {
            ProvisionError::Command {
                stage,
                step,
                source,
            } => {
                assert_eq!(stage, Stage::ConfiguringVpn);
                assert_eq!(step, "two");
                assert!(matches!(source, GatewayError::ExitStatus(1)));
            }
            other => panic!("expected command error, got {other:?}"),
        }
        assert_eq!(connector.commands(), vec!["first", "second"]);
    }

    #[test]
    fn strategy_follows_vpn_type() {
        let generator = Arc::new(CredentialGenerator::new());
        for vpn_type in [VpnType::Tunnel, VpnType::Certificate] {
            let strategy = Strategy::for_type(vpn_type, Arc::clone(&generator));
            assert_eq!(strategy.vpn_type(), vpn_type);
        }
    }
}
