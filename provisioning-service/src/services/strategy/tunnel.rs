use std::net::IpAddr;

use super::{run_steps, RemoteStep};
use crate::models::Stage;
use crate::services::error::ProvisionError;
use crate::services::gateway::RemoteSession;

const EASYRSA_DIR: &str = "/etc/openvpn/easy-rsa";

pub const CIPHER: &str = "AES-256-GCM";
pub const AUTH_DIGEST: &str = "SHA256";
pub const TRANSPORT: &str = "udp";
pub const PORT: u16 = 1194;

/// OpenVPN server PKI plus a text client profile.
///
/// The profile only carries connection parameters. Certificates and keys stay
/// on the host and are not embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TunnelStrategy;

impl TunnelStrategy {
    pub fn steps(&self) -> Vec<RemoteStep> {
        let easyrsa = |args: &str| format!("cd {EASYRSA_DIR} && EASYRSA_BATCH=1 ./easyrsa {args}");

        vec![
            RemoteStep::new(
                "stage easy-rsa",
                format!("mkdir -p {EASYRSA_DIR} && cp -r /usr/share/easy-rsa/* {EASYRSA_DIR}/"),
            ),
            RemoteStep::new("init pki", easyrsa("init-pki")),
            RemoteStep::new("build ca", easyrsa("build-ca nopass")),
            RemoteStep::new("build server certificate", easyrsa("build-server-full server nopass")),
            RemoteStep::new("build client certificate", easyrsa("build-client-full client nopass")),
            RemoteStep::new("generate dh parameters", easyrsa("gen-dh")),
            RemoteStep::new(
                "generate tls auth key",
                "openvpn --genkey secret /etc/openvpn/ta.key",
            ),
        ]
    }

    pub async fn configure(
        &self,
        session: &dyn RemoteSession,
        host: IpAddr,
    ) -> Result<String, ProvisionError> {
        run_steps(session, Stage::ConfiguringVpn, &self.steps()).await?;
        Ok(render_profile(host))
    }
}

pub fn render_profile(host: IpAddr) -> String {
    format!(
        "client
dev tun
proto {TRANSPORT}
remote {host} {PORT}
resolv-retry infinite
nobind
persist-key
persist-tun
remote-cert-tls server
cipher {CIPHER}
auth {AUTH_DIGEST}
key-direction 1
verb 3
"
    )
}
