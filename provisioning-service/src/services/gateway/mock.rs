//! Mock gateway implementations for testing.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{ConnectTarget, Connector, GatewayError, OutputSink, RemoteSession};

#[derive(Debug, Default)]
struct MockState {
    refuse: bool,
    fail_on: Mutex<Vec<String>>,
    commands: Mutex<Vec<String>>,
    targets: Mutex<Vec<ConnectTarget>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// Mock connector that hands out [`MockSession`]s sharing one command log.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connection attempt fails.
    pub fn refusing() -> Self {
        Self {
            state: Arc::new(MockState {
                refuse: true,
                ..MockState::default()
            }),
        }
    }

    /// Commands containing `needle` exit with status 1.
    pub fn fail_when(needle: impl Into<String>) -> Self {
        Self::default().and_fail_when(needle)
    }

    /// Adds another failure trigger. Clones share triggers.
    pub fn and_fail_when(self, needle: impl Into<String>) -> Self {
        if let Ok(mut fail_on) = self.state.fail_on.lock() {
            fail_on.push(needle.into());
        }
        self
    }

    /// Every command executed so far, across all sessions, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state
            .commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn targets(&self) -> Vec<ConnectTarget> {
        self.state
            .targets
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        target: &ConnectTarget,
    ) -> Result<Box<dyn RemoteSession>, GatewayError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut targets) = self.state.targets.lock() {
            targets.push(target.clone());
        }

        if self.state.refuse {
            return Err(GatewayError::Connect {
                addr: target.addr(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(Box::new(MockSession {
            host: target.host,
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Mock session for testing. Records commands and echoes them to the sink.
pub struct MockSession {
    host: IpAddr,
    state: Arc<MockState>,
    closed: AtomicBool,
}

#[async_trait]
impl RemoteSession for MockSession {
    fn host(&self) -> IpAddr {
        self.host
    }

    async fn run_command(
        &self,
        command: &str,
        sink: Arc<dyn OutputSink>,
    ) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(GatewayError::Closed);
        }

        if let Ok(mut commands) = self.state.commands.lock() {
            commands.push(command.to_string());
        }

        let fails = self
            .state
            .fail_on
            .lock()
            .map(|fail_on| fail_on.iter().any(|needle| command.contains(needle.as_str())))
            .unwrap_or(false);
        if fails {
            sink.stderr("mock: command failed");
            return Err(GatewayError::ExitStatus(1));
        }

        sink.stdout("mock: ok");
        Ok(())
    }

    async fn close(&self) -> Result<(), GatewayError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
