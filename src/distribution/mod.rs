//! In-process fan-out of snapshots to many independent consumers.
//!
//! Built on `tokio::sync::watch`: every subscriber observes values in commit
//! order, and a slow subscriber simply sees the newest value on its next read
//! (last-write-wins). Consumers only ever receive `Arc` handles to immutable
//! data, so a read can never observe a half-written snapshot.

use crate::telemetry::Snapshot;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Immutable copy of the history buffer, oldest first.
pub type HistoryView = Arc<[Arc<Snapshot>]>;

/// Latest snapshot and the history it was appended to, published together.
///
/// One value per commit, so `latest` is always the last entry of `history`
/// (or both are empty).
#[derive(Debug, Clone)]
pub struct Published {
    pub latest: Option<Arc<Snapshot>>,
    pub history: HistoryView,
}

impl Default for Published {
    fn default() -> Self {
        Self {
            latest: None,
            history: HistoryView::from(Vec::new()),
        }
    }
}

/// Publisher side, owned by the message store.
pub struct Hub {
    state: watch::Sender<Published>,
}

impl Hub {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Published::default());
        Self { state }
    }

    /// Publish a committed snapshot together with the history it was appended to.
    pub fn publish(&self, latest: Arc<Snapshot>, history: HistoryView) {
        self.state.send_replace(Published {
            latest: Some(latest),
            history,
        });
    }

    /// Publish the empty state after the store is cleared.
    pub fn reset(&self) {
        self.state.send_replace(Published::default());
    }

    /// Subscribe to latest and history as one consistent value.
    pub fn subscribe(&self) -> Subscription<Published> {
        Subscription::new(self.state.subscribe(), Published::clone)
    }

    /// Subscribe to "latest snapshot changed" notifications.
    pub fn subscribe_latest(&self) -> Subscription<Option<Arc<Snapshot>>> {
        Subscription::new(self.state.subscribe(), |p| p.latest.clone())
    }

    /// Subscribe to "history changed" notifications.
    pub fn subscribe_history(&self) -> Subscription<HistoryView> {
        Subscription::new(self.state.subscribe(), |p| Arc::clone(&p.history))
    }

    /// Run `callback` for every new snapshot until the returned guard is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_latest<F>(&self, mut callback: F) -> CallbackGuard
    where
        F: FnMut(Arc<Snapshot>) + Send + 'static,
    {
        let mut subscription = self.subscribe_latest();
        CallbackGuard::spawn(async move {
            while let Some(snapshot) = subscription.next_snapshot().await {
                callback(snapshot);
            }
        })
    }

    /// Live subscriptions of any kind.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side, a view onto the published state. Dropping it unsubscribes.
pub struct Subscription<T> {
    rx: watch::Receiver<Published>,
    project: fn(&Published) -> T,
}

impl<T> Subscription<T> {
    fn new(rx: watch::Receiver<Published>, project: fn(&Published) -> T) -> Self {
        Self { rx, project }
    }

    /// Current value without marking it seen.
    pub fn current(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for a value newer than the last one seen and return it.
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some((self.project)(&self.rx.borrow_and_update()))
    }

    /// Whether a value arrived that has not been read through [`Self::next`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {}
}

impl Subscription<Option<Arc<Snapshot>>> {
    /// Wait for the next published snapshot, skipping resets.
    pub async fn next_snapshot(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            if let Some(snapshot) = self.next().await? {
                return Some(snapshot);
            }
        }
    }
}

/// Keeps a callback subscription alive; dropping it stops the callback.
pub struct CallbackGuard {
    task: JoinHandle<()>,
}

impl CallbackGuard {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
