//! Message store: latest snapshot plus a bounded history ring buffer.
//!
//! The store is the single writer for both. Every accepted frame is
//! committed first and only then published through the [`Hub`], so a
//! notified subscriber always reads the frame it was notified about.

use crate::connection::FrameSink;
use crate::distribution::{HistoryView, Hub};
use crate::telemetry::{decode_frame, DecodeError, SeriesPoint, Snapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default number of snapshots kept for trend charts.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

struct Inner {
    latest: Option<Arc<Snapshot>>,
    history: VecDeque<Arc<Snapshot>>,
}

/// Owner of the latest snapshot and the recent history.
pub struct MessageStore {
    inner: RwLock<Inner>,
    capacity: usize,
    hub: Hub,
    frames_received: AtomicU64,
    decode_failures: AtomicU64,
}

impl MessageStore {
    /// Creates a store keeping the last 30 snapshots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a store keeping the last `capacity` snapshots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(Inner {
                latest: None,
                history: VecDeque::with_capacity(capacity),
            }),
            capacity,
            hub: Hub::new(),
            frames_received: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
        }
    }

    /// Distribution side for consumers.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Decode a raw frame, commit it and notify subscribers.
    ///
    /// A frame that fails to decode leaves the store untouched and is not
    /// published.
    pub fn ingest(&self, raw: &str) -> Result<Arc<Snapshot>, DecodeError> {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("pulseboard_frames_total").increment(1);

        let snapshot = match decode_frame(raw) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("pulseboard_decode_errors_total").increment(1);
                return Err(e);
            }
        };

        let mut inner = self.write();
        inner.latest = Some(Arc::clone(&snapshot));
        if inner.history.len() >= self.capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(Arc::clone(&snapshot));

        // Publish while still holding the write lock so notification order
        // always matches commit order.
        let history: HistoryView = inner.history.iter().cloned().collect();
        self.hub.publish(Arc::clone(&snapshot), history);

        Ok(snapshot)
    }

    /// Most recent snapshot, if any frame was ever accepted.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.read().latest.clone()
    }

    /// All retained snapshots, oldest first. The returned vector is a copy.
    pub fn history(&self) -> Vec<Arc<Snapshot>> {
        self.read().history.iter().cloned().collect()
    }

    /// Trend series for one server across the retained history.
    ///
    /// Snapshots where the server is absent are skipped.
    pub fn series(&self, server_id: u64) -> Vec<SeriesPoint> {
        self.read()
            .history
            .iter()
            .filter_map(|snapshot| snapshot.point(server_id))
            .collect()
    }

    /// Drop the latest snapshot and the history.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.latest = None;
        inner.history.clear();
        self.hub.reset();
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.read().history.len()
    }

    /// Returns true if no snapshot is retained.
    pub fn is_empty(&self) -> bool {
        self.read().history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames handed to the store, valid or not.
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Frames dropped because they failed to decode.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for MessageStore {
    fn on_frame(&self, raw: &str) {
        match self.ingest(raw) {
            Ok(snapshot) => tracing::trace!(
                server_time = snapshot.server_time,
                servers = snapshot.servers.len(),
                "Snapshot committed"
            ),
            Err(e) => tracing::warn!(error = %e, bytes = raw.len(), "Dropping undecodable frame"),
        }
    }
}
