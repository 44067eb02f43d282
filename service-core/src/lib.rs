//! service-core: Shared infrastructure for the provisioning workspace.
pub mod config;
pub mod error;
pub mod observability;

pub use serde;
pub use tracing;
pub use validator;
