//! # Metrics
//!
//! Prometheus export of stream and dashboard health.
//!
//! **Counters:**
//! - `pulseboard_frames_total` - Frames received from the stream
//! - `pulseboard_decode_errors_total` - Frames dropped as undecodable
//! - `pulseboard_reconnects_total` - Reconnects scheduled
//! - `pulseboard_proxy_requests_total{status}` - Proxied requests by status
//!
//! **Gauges:**
//! - `pulseboard_connected` - 1 while the stream is open
//! - `pulseboard_servers_total` / `pulseboard_servers_online` - Fleet in the latest snapshot
//! - `pulseboard_subscribers` - Live distribution subscriptions

pub mod handler;

use crate::store::MessageStore;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

/// Computes derived gauges and renders the exposition text.
pub struct MetricsCollector {
    store: Arc<MessageStore>,
    start_time: Instant,
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        store: Arc<MessageStore>,
        start_time: Instant,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        Self {
            store,
            start_time,
            prometheus_handle,
        }
    }

    /// Refresh gauges that are derived from the store on demand.
    pub fn update_gauges(&self) {
        let (total, online) = match self.store.latest() {
            Some(snapshot) => {
                let overview = snapshot.overview();
                (overview.total, overview.online)
            }
            None => (0, 0),
        };
        metrics::gauge!("pulseboard_servers_total").set(total as f64);
        metrics::gauge!("pulseboard_servers_online").set(online as f64);
        metrics::gauge!("pulseboard_subscribers").set(self.store.hub().subscriber_count() as f64);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the global Prometheus recorder.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Global recorder handle, or a detached one if a recorder is already
/// installed (several routers in one process, as in tests).
pub fn metrics_handle() -> PrometheusHandle {
    setup_metrics().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Metrics recorder already installed, using detached handle");
        PrometheusBuilder::new().build_recorder().handle()
    })
}
