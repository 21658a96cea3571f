//! Wire types mirroring the probe backend's JSON schema.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
///
/// The backend encodes empty lists and unset strings as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Static facts about a monitored host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platform_version: String,
    /// CPU model strings, one per package
    #[serde(deserialize_with = "null_as_default")]
    pub cpu: Vec<String>,
    /// GPU model strings
    #[serde(deserialize_with = "null_as_default")]
    pub gpu: Vec<String>,
    pub mem_total: u64,
    pub disk_total: u64,
    pub swap_total: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub arch: String,
    /// Unix seconds
    pub boot_time: u64,
    /// Agent version
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country_code: String,
}

/// One temperature sensor reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorReading {
    #[serde(alias = "Name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "Temperature")]
    pub temperature: f64,
}

/// Instantaneous state of a monitored host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostState {
    /// CPU utilization, already a percentage
    pub cpu: f64,
    pub mem_used: u64,
    pub swap_used: u64,
    pub disk_used: u64,
    /// Cumulative bytes received
    pub net_in_transfer: u64,
    /// Cumulative bytes sent
    pub net_out_transfer: u64,
    /// Bytes per second
    pub net_in_speed: u64,
    /// Bytes per second
    pub net_out_speed: u64,
    /// Seconds
    pub uptime: u64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
    pub tcp_conn_count: u64,
    pub udp_conn_count: u64,
    pub process_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub temperatures: Vec<SensorReading>,
    /// GPU utilization percentages
    #[serde(deserialize_with = "null_as_default")]
    pub gpu: Vec<f64>,
}

/// One monitored server inside a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country_code: String,
    /// ISO-8601 timestamp, or a zero-prefixed sentinel meaning "never"
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_active: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: HostInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: HostState,
}

impl ServerEntry {
    /// Last activity as unix milliseconds.
    ///
    /// `None` for an empty value, the zero-time sentinel
    /// (`0001-01-01T00:00:00Z`) or anything that is not RFC 3339.
    pub fn last_active_ms(&self) -> Option<i64> {
        let raw = self.last_active.trim();
        if raw.is_empty() || raw.starts_with('0') {
            return None;
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.timestamp_millis())
    }

    /// Country code, preferring the entry-level value over the host's.
    pub fn country(&self) -> &str {
        if self.country_code.is_empty() {
            &self.host.country_code
        } else {
            &self.country_code
        }
    }
}

/// One decoded frame. Immutable once built; shared as `Arc<Snapshot>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Backend reference clock, unix milliseconds
    pub server_time: i64,
    /// Entries with unique ids, in frame order
    pub servers: Vec<ServerEntry>,
    /// Number of dashboard viewers, when the backend reports it
    pub online_viewers: Option<u64>,
}

impl Snapshot {
    /// Look up one server by id.
    pub fn server(&self, id: u64) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.id == id)
    }
}
