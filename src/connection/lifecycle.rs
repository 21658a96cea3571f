//! Pure connection lifecycle state machine.
//!
//! The async run loop feeds socket events in and acts on what comes out.
//! Keeping the bookkeeping here means the attempt counter and the single
//! reconnect timer slot can be tested without any I/O.

use super::backoff::BackoffPolicy;
use serde::Serialize;
use std::time::Duration;

/// Why the last socket closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Server closed the stream.
    Remote,
    /// Dial or transport failure.
    Error(String),
    /// Local teardown.
    Shutdown,
}

/// Connection state as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed(CloseReason),
    /// Reconnect attempts exhausted. Terminal until restart.
    GaveUp,
}

/// Snapshot of the lifecycle published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub connected: bool,
    /// Reconnects scheduled since the last successful open
    pub attempts: u32,
    /// Delay of the pending reconnect, if one is scheduled
    pub retry_in_ms: Option<u64>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            connected: false,
            attempts: 0,
            retry_in_ms: None,
        }
    }
}

/// A scheduled reconnect. At most one exists at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectTimer {
    pub id: u64,
    /// Zero-based attempt this timer leads to
    pub attempt: u32,
    pub delay: Duration,
}

/// What the run loop should do after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterClose {
    Retry(ReconnectTimer),
    GiveUp,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    policy: BackoffPolicy,
    max_attempts: u32,
    state: ConnectionState,
    attempts: u32,
    timer: Option<ReconnectTimer>,
    next_timer_id: u64,
    torn_down: bool,
}

impl Lifecycle {
    pub fn new(policy: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            policy,
            max_attempts,
            state: ConnectionState::Idle,
            attempts: 0,
            timer: None,
            next_timer_id: 0,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn pending_timer(&self) -> Option<ReconnectTimer> {
        self.timer
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn on_connecting(&mut self) {
        if !self.torn_down && self.state != ConnectionState::GaveUp {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Socket opened: the attempt counter starts over.
    pub fn on_open(&mut self) {
        self.timer = None;
        self.attempts = 0;
        self.state = ConnectionState::Open;
    }

    /// Socket closed or dial failed. Decides whether to schedule a retry.
    pub fn on_closed(&mut self, reason: CloseReason) -> AfterClose {
        // Any pending timer is superseded by whatever is decided here.
        self.timer = None;

        if self.torn_down {
            self.state = ConnectionState::Closed(CloseReason::Shutdown);
            return AfterClose::Stopped;
        }

        if self.attempts >= self.max_attempts {
            self.state = ConnectionState::GaveUp;
            return AfterClose::GiveUp;
        }

        let timer = ReconnectTimer {
            id: self.next_timer_id,
            attempt: self.attempts,
            delay: self.policy.delay(self.attempts),
        };
        self.next_timer_id += 1;
        self.attempts += 1;
        self.timer = Some(timer);
        self.state = ConnectionState::Closed(reason);
        AfterClose::Retry(timer)
    }

    /// Timer expiry. Returns true only for the timer currently pending.
    pub fn fire(&mut self, timer_id: u64) -> bool {
        match self.timer {
            Some(timer) if timer.id == timer_id && !self.torn_down => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    /// Local close: cancels the pending timer and blocks further attempts.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.timer = None;
        if self.state != ConnectionState::GaveUp {
            self.state = ConnectionState::Closed(CloseReason::Shutdown);
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state.clone(),
            connected: self.is_open(),
            attempts: self.attempts,
            retry_in_ms: self.timer.map(|t| t.delay.as_millis() as u64),
        }
    }
}
