pub mod request;
pub mod stage;

pub use request::{
    AuthCredential, AuthMethod, ProvisioningRequest, ProvisioningResult, VpnType,
};
pub use stage::Stage;
