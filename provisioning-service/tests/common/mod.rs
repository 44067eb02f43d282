//! Common test utilities for provisioning-service integration tests.

#![allow(dead_code)]

use provisioning_service::dtos::ProvisionRequest;
use provisioning_service::services::gateway::MockConnector;
use provisioning_service::services::{CredentialGenerator, EntropySource, ProvisioningService};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,provisioning_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Build a service over `connector` and return both.
pub fn spawn_service(connector: MockConnector) -> (ProvisioningService<MockConnector>, MockConnector) {
    init_tracing();

    let service = ProvisioningService::new(
        connector.clone(),
        Arc::new(CredentialGenerator::new()),
        22,
    );
    (service, connector)
}

/// Entropy source that always fails, as when the OS RNG is unavailable.
pub struct BrokenEntropy;

impl EntropySource for BrokenEntropy {
    fn fill(&self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("getrandom unavailable"))
    }
}

/// Like [`spawn_service`], but every identifier draw fails.
pub fn spawn_service_without_entropy(
    connector: MockConnector,
) -> (ProvisioningService<MockConnector>, MockConnector) {
    init_tracing();

    let service = ProvisioningService::new(
        connector.clone(),
        Arc::new(CredentialGenerator::with_source(BrokenEntropy)),
        22,
    );
    (service, connector)
}

pub fn request(server_ip: &str, vpn_type: &str) -> ProvisionRequest {
    ProvisionRequest {
        server_ip: server_ip.to_string(),
        username: "root".to_string(),
        auth_method: "password".to_string(),
        auth_credential: "password123".to_string(),
        vpn_type: vpn_type.to_string(),
    }
}

pub fn key_request(server_ip: &str, vpn_type: &str, key: &str) -> ProvisionRequest {
    ProvisionRequest {
        auth_method: "key".to_string(),
        auth_credential: key.to_string(),
        ..request(server_ip, vpn_type)
    }
}

/// Index of the first recorded command containing `needle`.
pub fn position(commands: &[String], needle: &str) -> Option<usize> {
    commands.iter().position(|c| c.contains(needle))
}
