//! Remote session gateway.
//!
//! A [`Connector`] opens one authenticated [`RemoteSession`] to one host. The
//! session runs shell commands and streams their output to an [`OutputSink`].
//! The production implementation speaks SSH (see [`ssh`]); [`mock`] provides a
//! scriptable stand-in for tests.

pub mod mock;
pub mod ssh;

use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{AuthCredential, Stage};

pub use mock::{MockConnector, MockSession};
pub use ssh::{SshConnector, SshSession};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Connection to {addr} failed: {reason}")]
    Connect { addr: SocketAddr, reason: String },

    #[error("SSH handshake failed: {0}")]
    Handshake(String),

    #[error("Authentication failed for user '{0}'")]
    Authentication(String),

    #[error("Private key could not be parsed: {0}")]
    InvalidKey(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Remote command exited with status {0}")]
    ExitStatus(i32),

    #[error("Remote command killed by signal {0}")]
    Signal(String),

    #[error("Session is closed")]
    Closed,

    #[error("SSH task failed: {0}")]
    Task(String),
}

/// Host identity checking applied when a session is opened.
///
/// Only [`HostKeyPolicy::AcceptAny`] exists: targets are freshly created hosts
/// whose keys the caller cannot know in advance, so any presented key is
/// accepted and its SHA-256 fingerprint is logged. This leaves the first
/// connection open to interception by an on-path attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    #[default]
    AcceptAny,
}

/// Everything needed to open a session to one host.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub host: IpAddr,
    pub port: u16,
    pub username: String,
    pub credential: AuthCredential,
}

impl ConnectTarget {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Receives remote stdout/stderr, one line at a time.
pub trait OutputSink: Send + Sync {
    fn stdout(&self, line: &str);
    fn stderr(&self, line: &str);
}

/// Forwards remote output to `tracing` at DEBUG, tagged with the pipeline stage.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    stage: Stage,
}

impl TracingSink {
    pub fn new(stage: Stage) -> Arc<Self> {
        Arc::new(Self { stage })
    }
}

impl OutputSink for TracingSink {
    fn stdout(&self, line: &str) {
        tracing::debug!(stage = self.stage.as_str(), stream = "stdout", "{}", line);
    }

    fn stderr(&self, line: &str) {
        tracing::debug!(stage = self.stage.as_str(), stream = "stderr", "{}", line);
    }
}

/// One live connection to one host.
///
/// Dropping an implementation without calling [`RemoteSession::close`] must
/// still release the connection.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    fn host(&self) -> IpAddr;

    /// Run `command` in a fresh execution channel. Fails if the channel cannot
    /// be opened, the remote process exits non-zero, or it is killed by a signal.
    async fn run_command(
        &self,
        command: &str,
        sink: Arc<dyn OutputSink>,
    ) -> Result<(), GatewayError>;

    /// Disconnect. Idempotent.
    async fn close(&self) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &ConnectTarget)
        -> Result<Box<dyn RemoteSession>, GatewayError>;
}
