use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::time::Duration;

/// Port used when nothing overrides `APP__SSH__PORT`.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Package installs on a fresh host regularly run for several minutes with no output.
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 900;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    pub common: core_config::Config,
    pub ssh: SshConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SshConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for any single blocking SSH call, including reads while a
    /// remote command is still running. Zero disables the bound.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl SshConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Sections {
    #[serde(default)]
    ssh: SshConfig,
}

impl ProvisioningConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let sections: Sections = core_config::load_layered()?;

        if sections.ssh.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ssh.port must be a non-zero TCP port"
            )));
        }

        Ok(Self {
            common,
            ssh: sections.ssh,
        })
    }
}
