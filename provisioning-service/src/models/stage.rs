use std::fmt;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    Connecting,
    InstallingPackages,
    ConfiguringVpn,
    RotatingCredential,
    CleaningUp,
    Closed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Connecting => "connecting",
            Stage::InstallingPackages => "installing_packages",
            Stage::ConfiguringVpn => "configuring_vpn",
            Stage::RotatingCredential => "rotating_credential",
            Stage::CleaningUp => "cleaning_up",
            Stage::Closed => "closed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
