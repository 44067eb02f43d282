//! SSH implementation of the gateway on top of libssh2.
//!
//! libssh2 is blocking, so connect, every command and disconnect run on
//! tokio's blocking pool and never stall the async runtime.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use ssh2::{ExtendedData, HashType, Session};
use std::io::{BufRead, BufReader, Read};
use std::net::{IpAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{ConnectTarget, Connector, GatewayError, HostKeyPolicy, OutputSink, RemoteSession};
use crate::config::SshConfig;
use crate::models::AuthCredential;

#[derive(Debug, Clone)]
pub struct SshConnector {
    connect_timeout: Duration,
    command_timeout: Option<Duration>,
    host_key_policy: HostKeyPolicy,
}

impl SshConnector {
    pub fn new(config: &SshConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            command_timeout: config.command_timeout(),
            host_key_policy: HostKeyPolicy::default(),
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(
        &self,
        target: &ConnectTarget,
    ) -> Result<Box<dyn RemoteSession>, GatewayError> {
        let target = target.clone();
        let connector = self.clone();

        let session = tokio::task::spawn_blocking(move || connector.open(&target))
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))??;

        Ok(Box::new(session))
    }
}

impl SshConnector {
    fn open(&self, target: &ConnectTarget) -> Result<SshSession, GatewayError> {
        let addr = target.addr();
        let tcp = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|e| {
            GatewayError::Connect {
                addr,
                reason: e.to_string(),
            }
        })?;

        let mut session = Session::new().map_err(|e| GatewayError::Handshake(e.to_string()))?;
        session.set_tcp_stream(tcp);
        // libssh2 treats 0 as "wait forever".
        let timeout_ms = self
            .command_timeout
            .map(|t| u32::try_from(t.as_millis()).unwrap_or(u32::MAX))
            .unwrap_or(0);
        session.set_timeout(timeout_ms);
        session
            .handshake()
            .map_err(|e| GatewayError::Handshake(e.to_string()))?;

        match self.host_key_policy {
            HostKeyPolicy::AcceptAny => {
                let fingerprint = session
                    .host_key_hash(HashType::Sha256)
                    .map(hex::encode)
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::warn!(
                    host = %target.host,
                    fingerprint = %fingerprint,
                    "Accepting unverified SSH host key"
                );
            }
        }

        authenticate(&session, target)?;

        tracing::info!(host = %target.host, port = target.port, user = %target.username, "SSH session established");

        Ok(SshSession {
            host: target.host,
            session,
            closed: AtomicBool::new(false),
        })
    }
}

fn authenticate(session: &Session, target: &ConnectTarget) -> Result<(), GatewayError> {
    let result = match &target.credential {
        AuthCredential::Password(password) => {
            session.userauth_password(&target.username, password.expose_secret())
        }
        AuthCredential::PrivateKey(key) => {
            check_private_key(key.expose_secret())?;
            session.userauth_pubkey_memory(&target.username, None, key.expose_secret(), None)
        }
    };

    if let Err(e) = result {
        tracing::warn!(host = %target.host, error = %e, "SSH authentication rejected");
        return Err(GatewayError::Authentication(target.username.clone()));
    }
    if !session.authenticated() {
        return Err(GatewayError::Authentication(target.username.clone()));
    }

    Ok(())
}

/// Reject key material that is not a PEM/OpenSSH private key before it ever
/// reaches the server.
pub(crate) fn check_private_key(pem: &str) -> Result<(), GatewayError> {
    let trimmed = pem.trim();
    let header = trimmed
        .lines()
        .next()
        .ok_or_else(|| GatewayError::InvalidKey("empty key".to_string()))?;

    if !(header.starts_with("-----BEGIN ") && header.ends_with("PRIVATE KEY-----")) {
        return Err(GatewayError::InvalidKey(
            "missing private key header".to_string(),
        ));
    }
    if !trimmed.ends_with("PRIVATE KEY-----") || trimmed.lines().count() < 3 {
        return Err(GatewayError::InvalidKey("truncated key".to_string()));
    }

    Ok(())
}

pub struct SshSession {
    host: IpAddr,
    session: Session,
    closed: AtomicBool,
}

#[async_trait]
impl RemoteSession for SshSession {
    fn host(&self) -> IpAddr {
        self.host
    }

    async fn run_command(
        &self,
        command: &str,
        sink: Arc<dyn OutputSink>,
    ) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::Closed);
        }

        let session = self.session.clone();
        let command = command.to_string();

        tokio::task::spawn_blocking(move || exec(&session, &command, sink.as_ref()))
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?
    }

    async fn close(&self) -> Result<(), GatewayError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let session = self.session.clone();
        let host = self.host;
        tokio::task::spawn_blocking(move || {
            session
                .disconnect(None, "provisioning complete", None)
                .map_err(|e| GatewayError::Channel(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Task(e.to_string()))??;

        tracing::debug!(host = %host, "SSH session closed");
        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::warn!(host = %self.host, "SSH session dropped without close, disconnecting");
            let _ = self.session.disconnect(None, "session dropped", None);
        }
    }
}

fn exec(session: &Session, command: &str, sink: &dyn OutputSink) -> Result<(), GatewayError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| GatewayError::Channel(format!("open failed: {e}")))?;
    // stderr arrives on the stdout stream so lines keep their order and a
    // full stderr window can never stall the read loop.
    channel
        .handle_extended_data(ExtendedData::Merge)
        .map_err(|e| GatewayError::Channel(format!("stream merge failed: {e}")))?;
    channel
        .exec(command)
        .map_err(|e| GatewayError::Channel(format!("exec failed: {e}")))?;

    forward_lines(&mut channel, |line| sink.stdout(line))?;

    channel
        .wait_close()
        .map_err(|e| GatewayError::Channel(format!("close failed: {e}")))?;
    let status = channel
        .exit_status()
        .map_err(|e| GatewayError::Channel(format!("exit status unavailable: {e}")))?;
    let signal = channel
        .exit_signal()
        .map_err(|e| GatewayError::Channel(format!("exit signal unavailable: {e}")))?
        .exit_signal;

    exit_outcome(status, signal)
}

/// libssh2 reports status 0 for a process killed by a signal, so the signal
/// is checked first.
fn exit_outcome(status: i32, signal: Option<String>) -> Result<(), GatewayError> {
    if let Some(signal) = signal {
        return Err(GatewayError::Signal(signal));
    }
    if status != 0 {
        return Err(GatewayError::ExitStatus(status));
    }
    Ok(())
}

fn forward_lines<R: Read>(reader: R, mut emit: impl FnMut(&str)) -> Result<(), GatewayError> {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| GatewayError::Channel(format!("read failed: {e}")))?;
        if read == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buffer);
        emit(line.trim_end_matches(['\r', '\n']));
    }
}
