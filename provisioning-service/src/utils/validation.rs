use secrecy::SecretString;
use std::borrow::Cow;
use std::net::IpAddr;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::dtos::ProvisionRequest;
use crate::models::{AuthCredential, AuthMethod, ProvisioningRequest, VpnType};

/// Why an inbound request was rejected. Always a caller fault; nothing remote
/// has been touched when this is returned.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Validation error: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("invalid server IP address: {0}")]
    InvalidAddress(String),

    #[error("invalid authentication method: {0}")]
    UnknownAuthMethod(String),

    #[error("invalid VPN type: {0}")]
    UnknownVpnType(String),
}

pub fn validate_auth_method(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<AuthMethod>()
        .map(|_| ())
        .map_err(|_| rejection("auth_method", "invalid authentication method"))
}

pub fn validate_vpn_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<VpnType>()
        .map(|_| ())
        .map_err(|_| rejection("vpn_type", "invalid VPN type"))
}

fn rejection(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Check the request shape and convert it into the typed, immutable form the
/// pipeline consumes.
pub fn validate_request(request: ProvisionRequest) -> Result<ProvisioningRequest, RequestError> {
    request.validate()?;

    let host: IpAddr = request
        .server_ip
        .parse()
        .map_err(|_| RequestError::InvalidAddress(request.server_ip.clone()))?;
    let method: AuthMethod = request
        .auth_method
        .parse()
        .map_err(RequestError::UnknownAuthMethod)?;
    let vpn_type: VpnType = request
        .vpn_type
        .parse()
        .map_err(RequestError::UnknownVpnType)?;

    Ok(ProvisioningRequest::new(
        host,
        request.username,
        AuthCredential::new(method, SecretString::new(request.auth_credential)),
        vpn_type,
    ))
}
