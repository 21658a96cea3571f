//! Connection manager for the probe backend's snapshot stream.
//!
//! One background task owns the socket. It dials, forwards every inbound
//! text frame to a [`FrameSink`], and on any close schedules a single
//! reconnect according to the [`BackoffPolicy`] until the attempt budget
//! runs out. Callers never see connection errors directly; they observe
//! [`ConnectionStatus`] through the handle.
//!
//! ```no_run
//! use pulseboard::connection::{ConnectionConfig, ConnectionManager, WsDialer};
//! use pulseboard::store::MessageStore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(MessageStore::new());
//! let handle = ConnectionManager::spawn(
//!     ConnectionConfig::new("wss://probe.example.com/api/v1/ws/server"),
//!     Arc::new(WsDialer::default()),
//!     store.clone(),
//! );
//! handle.wait_for(|s| s.connected).await;
//! handle.close().await;
//! # }
//! ```

mod backoff;
mod error;
mod lifecycle;
mod transport;

pub use backoff::BackoffPolicy;
pub use error::ConnectionError;
pub use lifecycle::{
    AfterClose, CloseReason, ConnectionState, ConnectionStatus, Lifecycle, ReconnectTimer,
};
pub use transport::{Dialer, Transport, WsDialer, WsTransport};

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receives every inbound text frame, verbatim and in arrival order.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, raw: &str);
}

/// Default reconnect budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub policy: BackoffPolicy,
    pub max_attempts: u32,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            policy: BackoffPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

enum PumpEvent {
    Cancelled,
    Outbound(String),
    Inbound(Option<Result<String, ConnectionError>>),
}

/// Background task driving one stream connection.
pub struct ConnectionManager {
    config: ConnectionConfig,
    dialer: Arc<dyn Dialer>,
    sink: Arc<dyn FrameSink>,
    lifecycle: Lifecycle,
    commands: mpsc::UnboundedReceiver<String>,
    status: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    /// Start connecting to `config.url` in the background.
    ///
    /// Must be called from within a tokio runtime. Connection failures are
    /// never returned; they feed the retry cycle.
    pub fn spawn(
        config: ConnectionConfig,
        dialer: Arc<dyn Dialer>,
        sink: Arc<dyn FrameSink>,
    ) -> ConnectionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let cancel = CancellationToken::new();

        let manager = Self {
            lifecycle: Lifecycle::new(config.policy, config.max_attempts),
            config,
            dialer,
            sink,
            commands: command_rx,
            status: status_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(manager.run());

        ConnectionHandle {
            commands: command_tx,
            status: status_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        loop {
            self.lifecycle.on_connecting();
            self.publish();
            tracing::info!(
                url = %self.config.url,
                attempt = self.lifecycle.attempts(),
                "Connecting to stream"
            );

            let dialed = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.dialer.dial(&self.config.url) => result,
            };

            let reason = match dialed {
                Ok(mut transport) => {
                    self.drop_stale_commands();
                    self.lifecycle.on_open();
                    self.publish();
                    tracing::info!(url = %self.config.url, "Stream connected");

                    let reason = self.pump(transport.as_mut()).await;
                    transport.close().await;
                    reason
                }
                Err(e) => {
                    tracing::warn!(url = %self.config.url, error = %e, "Stream connection failed");
                    CloseReason::Error(e.to_string())
                }
            };

            if self.cancel.is_cancelled() {
                break;
            }

            match self.lifecycle.on_closed(reason) {
                AfterClose::Retry(timer) => {
                    self.publish();
                    metrics::counter!("pulseboard_reconnects_total").increment(1);
                    tracing::info!(
                        attempt = timer.attempt + 1,
                        max_attempts = self.config.max_attempts,
                        delay_ms = timer.delay.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    if !self.wait(timer).await {
                        break;
                    }
                }
                AfterClose::GiveUp => {
                    self.publish();
                    tracing::error!(
                        url = %self.config.url,
                        max_attempts = self.config.max_attempts,
                        "Reconnect attempts exhausted, giving up"
                    );
                    return;
                }
                AfterClose::Stopped => break,
            }
        }

        self.lifecycle.teardown();
        self.publish();
        tracing::debug!(url = %self.config.url, "Connection manager stopped");
    }

    /// Forward frames until the socket closes or the manager is cancelled.
    async fn pump(&mut self, transport: &mut dyn Transport) -> CloseReason {
        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => PumpEvent::Cancelled,
                Some(payload) = self.commands.recv() => PumpEvent::Outbound(payload),
                inbound = transport.recv() => PumpEvent::Inbound(inbound),
            };

            match event {
                PumpEvent::Cancelled => return CloseReason::Shutdown,
                PumpEvent::Outbound(payload) => {
                    if let Err(e) = transport.send(payload).await {
                        tracing::warn!(error = %e, "Failed to send on stream");
                        return CloseReason::Error(e.to_string());
                    }
                }
                PumpEvent::Inbound(Some(Ok(frame))) => self.sink.on_frame(&frame),
                PumpEvent::Inbound(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Stream transport error");
                    return CloseReason::Error(e.to_string());
                }
                PumpEvent::Inbound(None) => {
                    tracing::info!(url = %self.config.url, "Stream closed by remote");
                    return CloseReason::Remote;
                }
            }
        }
    }

    /// Wait out a reconnect timer. Returns false if cancelled meanwhile.
    async fn wait(&mut self, timer: ReconnectTimer) -> bool {
        let sleep = tokio::time::sleep(timer.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return self.lifecycle.fire(timer.id),
                Some(payload) = self.commands.recv() => {
                    tracing::warn!(bytes = payload.len(), "Stream not open, dropping outbound message");
                }
            }
        }
    }

    /// Messages queued while the previous socket was going down.
    fn drop_stale_commands(&mut self) {
        while let Ok(payload) = self.commands.try_recv() {
            tracing::warn!(bytes = payload.len(), "Dropping outbound message queued before reconnect");
        }
    }

    fn publish(&self) {
        let status = self.lifecycle.status();
        metrics::gauge!("pulseboard_connected").set(if status.connected { 1.0 } else { 0.0 });
        self.status.send_replace(status);
    }
}

/// Owner-side handle of a running [`ConnectionManager`].
///
/// Dropping the handle tears the connection down.
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<String>,
    status: watch::Receiver<ConnectionStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Queue an outbound text message. Only accepted while the stream is open.
    pub fn send(&self, payload: impl Into<String>) -> bool {
        if !self.is_connected() {
            tracing::warn!("Stream not open, dropping outbound message");
            return false;
        }
        self.commands.send(payload.into()).is_ok()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().connected
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait until the status satisfies `predicate` and return it.
    ///
    /// If the manager has stopped, returns the final status.
    pub async fn wait_for<F>(&self, mut predicate: F) -> ConnectionStatus
    where
        F: FnMut(&ConnectionStatus) -> bool,
    {
        let mut rx = self.status.clone();
        let reached = rx.wait_for(|s| predicate(s)).await.map(|s| s.clone());
        reached.unwrap_or_else(|_| rx.borrow().clone())
    }

    /// Cancel any pending reconnect, close the socket and wait for the task.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Connection task ended abnormally");
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
