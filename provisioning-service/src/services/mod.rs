pub mod credentials;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod orchestrator;
pub mod provisioning;
pub mod strategy;

pub use credentials::{CredentialGenerator, EntropySource, GenerationError};
pub use error::{ErrorKind, ProvisionError};
pub use orchestrator::Provisioner;
pub use provisioning::ProvisioningService;
pub use strategy::Strategy;
