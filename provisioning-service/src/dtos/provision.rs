use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::ProvisioningResult;

/// Inbound body of a VPN provisioning call, as decoded by the transport layer.
#[derive(Clone, Deserialize, Validate)]
pub struct ProvisionRequest {
    #[validate(ip(message = "invalid server IP address"))]
    pub server_ip: String,

    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(custom(function = "crate::utils::validation::validate_auth_method"))]
    pub auth_method: String,

    #[validate(length(min = 1, message = "authentication credential is required"))]
    pub auth_credential: String,

    #[validate(custom(function = "crate::utils::validation::validate_vpn_type"))]
    pub vpn_type: String,
}

impl fmt::Debug for ProvisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionRequest")
            .field("server_ip", &self.server_ip)
            .field("username", &self.username)
            .field("auth_method", &self.auth_method)
            .field("auth_credential", &"[REDACTED]")
            .field("vpn_type", &self.vpn_type)
            .finish()
    }
}

#[derive(Serialize)]
pub struct ProvisionResponse {
    pub config: String,
    pub new_password: String,
}

impl fmt::Debug for ProvisionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionResponse")
            .field("config", &format_args!("<{} bytes>", self.config.len()))
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

impl From<ProvisioningResult> for ProvisionResponse {
    fn from(result: ProvisioningResult) -> Self {
        Self {
            config: result.config,
            new_password: result.new_password.expose_secret().clone(),
        }
    }
}
