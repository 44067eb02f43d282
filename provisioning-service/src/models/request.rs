use secrecy::SecretString;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// How the caller proves identity to the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    Key,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::Key => "key",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "password" => Ok(AuthMethod::Password),
            "key" => Ok(AuthMethod::Key),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VPN flavour to install. Wire names are `openvpn` and `ios`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VpnType {
    /// OpenVPN tunnel with a text `.ovpn` client profile.
    Tunnel,
    /// strongSwan IKEv2 with a certificate authority and a property-list profile.
    Certificate,
}

impl VpnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VpnType::Tunnel => "openvpn",
            VpnType::Certificate => "ios",
        }
    }
}

impl FromStr for VpnType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "openvpn" => Ok(VpnType::Tunnel),
            "ios" => Ok(VpnType::Certificate),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for VpnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret material for the selected [`AuthMethod`].
#[derive(Debug, Clone)]
pub enum AuthCredential {
    Password(SecretString),
    /// PEM/OpenSSH private key text.
    PrivateKey(SecretString),
}

impl AuthCredential {
    pub fn new(method: AuthMethod, secret: SecretString) -> Self {
        match method {
            AuthMethod::Password => AuthCredential::Password(secret),
            AuthMethod::Key => AuthCredential::PrivateKey(secret),
        }
    }

    pub fn method(&self) -> AuthMethod {
        match self {
            AuthCredential::Password(_) => AuthMethod::Password,
            AuthCredential::PrivateKey(_) => AuthMethod::Key,
        }
    }
}

/// A request that already passed validation. Fields are read-only.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    host: IpAddr,
    username: String,
    credential: AuthCredential,
    vpn_type: VpnType,
}

impl ProvisioningRequest {
    pub(crate) fn new(
        host: IpAddr,
        username: String,
        credential: AuthCredential,
        vpn_type: VpnType,
    ) -> Self {
        Self {
            host,
            username,
            credential,
            vpn_type,
        }
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> &AuthCredential {
        &self.credential
    }

    pub fn vpn_type(&self) -> VpnType {
        self.vpn_type
    }
}

/// Output of one successful pipeline run. Returned once, never stored.
#[derive(Debug)]
pub struct ProvisioningResult {
    pub config: String,
    pub new_password: SecretString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn vpn_type_uses_wire_names() {
        assert_eq!("openvpn".parse::<VpnType>(), Ok(VpnType::Tunnel));
        assert_eq!("ios".parse::<VpnType>(), Ok(VpnType::Certificate));
        assert_eq!("wireguard".parse::<VpnType>(), Err("wireguard".to_string()));
        assert_eq!(VpnType::Certificate.to_string(), "ios");
    }

    #[test]
    fn auth_method_is_case_sensitive() {
        assert_eq!("key".parse::<AuthMethod>(), Ok(AuthMethod::Key));
        assert!("Password".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential =
            AuthCredential::new(AuthMethod::Password, SecretString::new("pw123".to_string()));

        assert_eq!(credential.method(), AuthMethod::Password);
        assert!(!format!("{:?}", credential).contains("pw123"));
        match credential {
            AuthCredential::Password(secret) => assert_eq!(secret.expose_secret(), "pw123"),
            AuthCredential::PrivateKey(_) => panic!("expected password credential"),
        }
    }
}
