//! Shared test utilities: an in-memory dialer and frame builders.

#![allow(dead_code)]

use async_trait::async_trait;
use pulseboard::connection::{ConnectionError, Dialer, FrameSink, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

// =============================================================================
// Mock transport
// =============================================================================

/// Server side of one accepted mock connection.
pub struct ServerEnd {
    frames: mpsc::UnboundedSender<Result<String, ConnectionError>>,
    pub sent: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl ServerEnd {
    pub fn send_frame(&self, frame: impl Into<String>) {
        let _ = self.frames.send(Ok(frame.into()));
    }

    pub fn fail(&self, message: &str) {
        let _ = self
            .frames
            .send(Err(ConnectionError::Transport(message.to_string())));
    }

    /// Whether the client closed its end.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close from the server side.
    pub fn close(self) {}
}

struct MockTransport {
    frames: mpsc::UnboundedReceiver<Result<String, ConnectionError>>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn recv(&mut self) -> Option<Result<String, ConnectionError>> {
        self.frames.recv().await
    }

    async fn send(&mut self, payload: String) -> Result<(), ConnectionError> {
        self.sent
            .send(payload)
            .map_err(|_| ConnectionError::Closed)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct DialerState {
    dials: Vec<Instant>,
    failures_left: u32,
    accept: bool,
}

/// Dialer that hands every accepted connection's server end to the test.
pub struct MockDialer {
    state: Mutex<DialerState>,
    accepted: mpsc::UnboundedSender<ServerEnd>,
}

impl MockDialer {
    pub fn new(accept: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let dialer = Arc::new(Self {
            state: Mutex::new(DialerState {
                dials: Vec::new(),
                failures_left: 0,
                accept,
            }),
            accepted,
        });
        (dialer, rx)
    }

    /// Refuse the next `n` dials regardless of `accept`.
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().failures_left = n;
    }

    pub fn set_accept(&self, accept: bool) {
        self.state.lock().unwrap().accept = accept;
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().dials.clone()
    }

    pub fn dial_count(&self) -> usize {
        self.state.lock().unwrap().dials.len()
    }

    /// Gaps between consecutive dials, in milliseconds.
    pub fn dial_gaps_ms(&self) -> Vec<u128> {
        self.dial_times()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis())
            .collect()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        let refuse = {
            let mut state = self.state.lock().unwrap();
            state.dials.push(Instant::now());
            if state.failures_left > 0 {
                state.failures_left -= 1;
                true
            } else {
                !state.accept
            }
        };
        if refuse {
            return Err(ConnectionError::Dial {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let _ = self.accepted.send(ServerEnd {
            frames: frames_tx,
            sent: sent_rx,
            closed: Arc::clone(&closed),
        });

        Ok(Box::new(MockTransport {
            frames: frames_rx,
            sent: sent_tx,
            closed,
        }))
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Records every frame verbatim.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }
}

impl FrameSink for RecordingSink {
    fn on_frame(&self, raw: &str) {
        self.frames.lock().unwrap().push(raw.to_string());
    }
}

// =============================================================================
// Frame builders
// =============================================================================

/// Frame with one server whose last activity is `now - age_ms`.
pub fn frame_with_age(now: i64, id: u64, age_ms: i64) -> String {
    let last_active = chrono::DateTime::from_timestamp_millis(now - age_ms)
        .unwrap()
        .to_rfc3339();
    serde_json::json!({
        "now": now,
        "servers": [{
            "id": id,
            "name": format!("node-{}", id),
            "country_code": "nl",
            "last_active": last_active,
            "host": {"mem_total": 1000, "disk_total": 1000},
            "state": {"cpu": 12.5, "mem_used": 250, "disk_used": 500, "net_out_speed": 1048576}
        }]
    })
    .to_string()
}

/// Minimal valid frame tagged by `now`.
pub fn frame(now: i64) -> String {
    frame_with_age(now, 1, 0)
}

/// Poll `check` until it holds, advancing (possibly paused) time in small steps.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
