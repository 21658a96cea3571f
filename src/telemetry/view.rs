//! Derived, render-ready views computed from a snapshot.
//!
//! All derivations are pure: the same snapshot always yields the same views.

use super::types::{ServerEntry, Snapshot};
use serde::{Deserialize, Serialize};

/// Maximum staleness before a server is shown offline.
pub const PRESENCE_THRESHOLD_MS: i64 = 30_000;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// `used / total * 100`, or 0 when the total is missing or zero.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let value = used as f64 / total as f64 * 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Bytes per second to MiB per second.
pub fn mib_per_sec(bytes_per_sec: u64) -> f64 {
    bytes_per_sec as f64 / BYTES_PER_MIB
}

/// Presence relative to the backend clock. The boundary is inclusive.
pub fn is_online(server_time_ms: i64, last_active_ms: Option<i64>) -> bool {
    match last_active_ms {
        Some(last) => server_time_ms.saturating_sub(last) <= PRESENCE_THRESHOLD_MS,
        None => false,
    }
}

/// Render-ready state of one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerView {
    pub id: u64,
    pub name: String,
    pub country_code: String,
    pub online: bool,
    /// Unix milliseconds, absent when the server never reported
    pub last_active_ms: Option<i64>,
    pub uptime: u64,
    pub version: String,
    pub platform: String,
    pub platform_version: String,
    pub arch: String,
    pub cpu_info: Vec<String>,
    pub gpu_info: Vec<String>,
    /// CPU utilization percentage
    pub cpu: f64,
    /// Memory utilization percentage
    pub mem: f64,
    /// Swap utilization percentage
    pub swap: f64,
    /// Disk utilization percentage
    pub disk: f64,
    /// Outbound speed, MiB/s
    pub up: f64,
    /// Inbound speed, MiB/s
    pub down: f64,
    pub net_in_transfer: u64,
    pub net_out_transfer: u64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
    pub tcp: u64,
    pub udp: u64,
    pub process: u64,
    pub temperatures: Vec<(String, f64)>,
}

impl ServerEntry {
    /// Derive the render-ready view against the given reference clock.
    pub fn view(&self, server_time_ms: i64) -> ServerView {
        let last_active_ms = self.last_active_ms();
        let host = &self.host;
        let state = &self.state;

        ServerView {
            id: self.id,
            name: self.name.clone(),
            country_code: self.country().to_lowercase(),
            online: is_online(server_time_ms, last_active_ms),
            last_active_ms,
            uptime: state.uptime,
            version: host.version.clone(),
            platform: host.platform.clone(),
            platform_version: host.platform_version.clone(),
            arch: host.arch.clone(),
            cpu_info: host.cpu.clone(),
            gpu_info: host.gpu.clone(),
            cpu: if state.cpu.is_finite() { state.cpu } else { 0.0 },
            mem: percent(state.mem_used, host.mem_total),
            swap: percent(state.swap_used, host.swap_total),
            disk: percent(state.disk_used, host.disk_total),
            up: mib_per_sec(state.net_out_speed),
            down: mib_per_sec(state.net_in_speed),
            net_in_transfer: state.net_in_transfer,
            net_out_transfer: state.net_out_transfer,
            load_1: state.load_1,
            load_5: state.load_5,
            load_15: state.load_15,
            tcp: state.tcp_conn_count,
            udp: state.udp_conn_count,
            process: state.process_count,
            temperatures: state
                .temperatures
                .iter()
                .map(|t| (t.name.clone(), t.temperature))
                .collect(),
        }
    }
}

/// Fleet-wide aggregate of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub server_time: i64,
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Summed outbound speed, MiB/s
    pub up: f64,
    /// Summed inbound speed, MiB/s
    pub down: f64,
    pub net_in_transfer: u64,
    pub net_out_transfer: u64,
    /// Distinct lowercase country codes, sorted
    pub countries: Vec<String>,
    pub online_viewers: Option<u64>,
}

/// One point of a per-server trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub server_time: i64,
    pub online: bool,
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
    pub up: f64,
    pub down: f64,
}

impl From<(i64, &ServerView)> for SeriesPoint {
    fn from((server_time, view): (i64, &ServerView)) -> Self {
        Self {
            server_time,
            online: view.online,
            cpu: view.cpu,
            mem: view.mem,
            disk: view.disk,
            up: view.up,
            down: view.down,
        }
    }
}

impl Snapshot {
    /// Derived views for every server, in frame order.
    pub fn views(&self) -> Vec<ServerView> {
        self.servers
            .iter()
            .map(|s| s.view(self.server_time))
            .collect()
    }

    /// Aggregate counts and totals across the fleet.
    pub fn overview(&self) -> Overview {
        let mut overview = Overview {
            server_time: self.server_time,
            total: self.servers.len(),
            online_viewers: self.online_viewers,
            ..Overview::default()
        };

        for view in self.views() {
            if view.online {
                overview.online += 1;
            }
            overview.up += view.up;
            overview.down += view.down;
            overview.net_in_transfer = overview.net_in_transfer.saturating_add(view.net_in_transfer);
            overview.net_out_transfer = overview
                .net_out_transfer
                .saturating_add(view.net_out_transfer);
            if !view.country_code.is_empty() && !overview.countries.contains(&view.country_code) {
                overview.countries.push(view.country_code);
            }
        }

        overview.offline = overview.total - overview.online;
        overview.countries.sort();
        overview
    }

    /// Trend point for one server, if present in this snapshot.
    pub fn point(&self, server_id: u64) -> Option<SeriesPoint> {
        self.server(server_id)
            .map(|s| SeriesPoint::from((self.server_time, &s.view(self.server_time))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::decode_frame;
    use proptest::prelude::*;

    #[test]
    fn test_presence_boundary() {
        assert!(is_online(30_000, Some(0)));
        assert!(!is_online(30_001, Some(0)));
        assert!(!is_online(1_000, None));
    }

    #[test]
    fn test_presence_scenario_from_frames() {
        let first = decode_frame(
            r#"{"now":1000,"servers":[{"id":1,"last_active":"1970-01-01T00:00:00.970Z"}]}"#,
        )
        .unwrap();
        assert!(first.views()[0].online);

        let second = decode_frame(
            r#"{"now":40970,"servers":[{"id":1,"last_active":"1970-01-01T00:00:00.970Z"}]}"#,
        )
        .unwrap();
        assert!(!second.views()[0].online);
    }

    #[test]
    fn test_percent_guard() {
        assert_eq!(percent(512, 0), 0.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(512, 1024), 50.0);
    }

    #[test]
    fn test_speed_normalized_to_mib() {
        assert_eq!(mib_per_sec(1_048_576), 1.0);
        assert_eq!(mib_per_sec(0), 0.0);
    }

    #[test]
    fn test_view_missing_totals_yield_zero_percent() {
        let snapshot = decode_frame(
            r#"{"now":1,"servers":[{"id":1,"state":{"mem_used":100,"disk_used":5,"swap_used":9}}]}"#,
        )
        .unwrap();
        let view = &snapshot.views()[0];
        assert_eq!(view.mem, 0.0);
        assert_eq!(view.disk, 0.0);
        assert_eq!(view.swap, 0.0);
        assert!(!view.online);
    }

    #[test]
    fn test_overview_counts_and_countries() {
        let snapshot = decode_frame(
            r#"{"now":100000,"online":2,"servers":[
                {"id":1,"country_code":"JP","last_active":"1970-01-01T00:01:30Z","state":{"net_out_speed":1048576,"net_in_transfer":10}},
                {"id":2,"country_code":"de","last_active":"0001-01-01T00:00:00Z","state":{"net_in_speed":2097152,"net_in_transfer":5}},
                {"id":3,"country_code":"jp","last_active":"1970-01-01T00:01:40Z"}
            ]}"#,
        )
        .unwrap();

        let overview = snapshot.overview();
        assert_eq!(overview.total, 3);
        assert_eq!(overview.online, 2);
        assert_eq!(overview.offline, 1);
        assert_eq!(overview.up, 1.0);
        assert_eq!(overview.down, 2.0);
        assert_eq!(overview.net_in_transfer, 15);
        assert_eq!(overview.countries, vec!["de".to_string(), "jp".to_string()]);
        assert_eq!(overview.online_viewers, Some(2));
    }

    #[test]
    fn test_views_are_deterministic() {
        let raw = r#"{"now":5000,"servers":[{"id":9,"last_active":"1970-01-01T00:00:01Z","host":{"mem_total":10},"state":{"mem_used":3}}]}"#;
        let a = decode_frame(raw).unwrap().views();
        let b = decode_frame(raw).unwrap().views();
        assert_eq!(a, b);
    }

    #[test]
    fn test_point_for_missing_server() {
        let snapshot = decode_frame(r#"{"now":1,"servers":[{"id":1}]}"#).unwrap();
        assert!(snapshot.point(1).is_some());
        assert!(snapshot.point(2).is_none());
    }

    proptest! {
        #[test]
        fn prop_online_iff_within_threshold(now in 0i64..1_000_000_000, gap in 0i64..100_000) {
            let last = now - gap;
            prop_assert_eq!(is_online(now, Some(last)), gap <= PRESENCE_THRESHOLD_MS);
        }

        #[test]
        fn prop_percent_is_finite(used in any::<u64>(), total in any::<u64>()) {
            let value = percent(used, total);
            prop_assert!(value.is_finite());
            if total == 0 {
                prop_assert_eq!(value, 0.0);
            }
        }
    }
}
