use std::net::IpAddr;
use std::sync::Arc;

use super::{run_steps, RemoteStep};
use crate::models::Stage;
use crate::services::credentials::CredentialGenerator;
use crate::services::error::ProvisionError;
use crate::services::gateway::RemoteSession;

pub const CA_LIFETIME_DAYS: u32 = 3650;
const KEY_SIZE: u32 = 4096;
const CA_DN: &str = "CN=VPN Root CA";

const PRIVATE_DIR: &str = "/etc/ipsec.d/private";
const CACERTS_DIR: &str = "/etc/ipsec.d/cacerts";
const CERTS_DIR: &str = "/etc/ipsec.d/certs";

/// strongSwan IKEv2 with a self-signed CA, rendered as an Apple
/// configuration profile.
pub struct CertificateStrategy {
    generator: Arc<CredentialGenerator>,
}

impl CertificateStrategy {
    pub fn new(generator: Arc<CredentialGenerator>) -> Self {
        Self { generator }
    }

    pub fn steps(&self, host: IpAddr) -> Vec<RemoteStep> {
        let ca_key = format!("{PRIVATE_DIR}/ca-key.pem");
        let ca_cert = format!("{CACERTS_DIR}/ca-cert.pem");
        let server_key = format!("{PRIVATE_DIR}/server-key.pem");
        let server_cert = format!("{CERTS_DIR}/server-cert.pem");

        vec![
            RemoteStep::new(
                "prepare pki directories",
                format!("mkdir -p {PRIVATE_DIR} {CACERTS_DIR} {CERTS_DIR} && chmod 700 {PRIVATE_DIR}"),
            ),
            RemoteStep::new(
                "generate ca key",
                format!("ipsec pki --gen --type rsa --size {KEY_SIZE} --outform pem > {ca_key}"),
            ),
            RemoteStep::new(
                "self-sign ca certificate",
                format!(
                    "ipsec pki --self --ca --lifetime {CA_LIFETIME_DAYS} --in {ca_key} --type rsa \
                     --dn '{CA_DN}' --outform pem > {ca_cert}"
                ),
            ),
            RemoteStep::new(
                "generate server key",
                format!("ipsec pki --gen --type rsa --size {KEY_SIZE} --outform pem > {server_key}"),
            ),
            RemoteStep::new(
                "issue server certificate",
                format!(
                    "ipsec pki --pub --in {server_key} --type rsa | ipsec pki --issue \
                     --lifetime {CA_LIFETIME_DAYS} --cacert {ca_cert} --cakey {ca_key} \
                     --dn 'CN={host}' --san '{host}' --flag serverAuth --flag ikeIntermediate \
                     --outform pem > {server_cert}"
                ),
            ),
        ]
    }

    pub async fn configure(
        &self,
        session: &dyn RemoteSession,
        host: IpAddr,
    ) -> Result<String, ProvisionError> {
        run_steps(session, Stage::ConfiguringVpn, &self.steps(host)).await?;

        let payload_uuid = self.generator.generate_identifier()?;
        let profile_uuid = self.generator.generate_identifier()?;
        Ok(render_profile(host, &payload_uuid, &profile_uuid))
    }
}

/// `payload_uuid` identifies the inner VPN payload, `profile_uuid` the
/// enclosing configuration profile.
pub fn render_profile(host: IpAddr, payload_uuid: &str, profile_uuid: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>PayloadContent</key>
	<array>
		<dict>
			<key>IKEv2</key>
			<dict>
				<key>RemoteAddress</key>
				<string>{host}</string>
				<key>RemoteIdentifier</key>
				<string>{host}</string>
				<key>LocalIdentifier</key>
				<string>client</string>
				<key>AuthenticationMethod</key>
				<string>Certificate</string>
			</dict>
			<key>PayloadDescription</key>
			<string>Configures VPN settings</string>
			<key>PayloadDisplayName</key>
			<string>IKEv2 VPN</string>
			<key>PayloadIdentifier</key>
			<string>com.vpn.ikev2</string>
			<key>PayloadType</key>
			<string>com.apple.vpn.managed</string>
			<key>PayloadUUID</key>
			<string>{payload_uuid}</string>
			<key>PayloadVersion</key>
			<integer>1</integer>
		</dict>
	</array>
	<key>PayloadDisplayName</key>
	<string>IKEv2 VPN Configuration</string>
	<key>PayloadIdentifier</key>
	<string>com.vpn.ikev2.config</string>
	<key>PayloadType</key>
	<string>Configuration</string>
	<key>PayloadUUID</key>
	<string>{profile_uuid}</string>
	<key>PayloadVersion</key>
	<integer>1</integer>
</dict>
</plist>
"#
    )
}
