pub mod provision;

pub use provision::{ProvisionRequest, ProvisionResponse};
