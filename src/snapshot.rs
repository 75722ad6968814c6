//! Point-in-time resource usage readings as emitted on a container's stats stream.
//!
//! The types mirror the JSON document the Docker Engine returns from
//! `GET /containers/{id}/stats`. Only the counters the agent publishes are modelled; unknown
//! fields are ignored and absent or `null` fields decode to zero or empty, so a snapshot from a
//! cgroup v2 host (which lacks most of the v1 memory breakdown) still decodes.
//!
//! # Example
//!
//! ```rust
//! use dox_agent::snapshot::StatSnapshot;
//!
//! let raw = r#"{
//!     "cpu_stats": {"cpu_usage": {"total_usage": 100, "percpu_usage": [60, 40]}, "system_cpu_usage": 9000},
//!     "memory_stats": {"usage": 2048, "limit": 4096, "stats": null},
//!     "blkio_stats": {"io_service_bytes_recursive": null}
//! }"#;
//! let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
//! assert_eq!(snapshot.cpu_stats.cpu_usage.percpu_usage, vec![60, 40]);
//! assert_eq!(snapshot.memory_stats.usage, 2048);
//! assert!(snapshot.blkio_stats.io_service_bytes_recursive.is_empty());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Deserializes `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One stats reading for a single container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpu_stats: CpuStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_stats: MemoryStats,
    /// Legacy single-interface network counters (Docker API < 1.21).
    #[serde(default)]
    pub network: Option<NetworkStats>,
    /// Per-interface network counters.
    #[serde(default)]
    pub networks: Option<HashMap<String, NetworkStats>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blkio_stats: BlkioStats,
}

impl StatSnapshot {
    /// Returns the network counters of the container.
    ///
    /// Prefers the legacy `network` object if present, otherwise sums all interfaces reported
    /// in `networks`.
    pub fn network_totals(&self) -> NetworkStats {
        if let Some(network) = &self.network {
            return network.clone();
        }

        let mut sum = NetworkStats::default();
        for stats in self.networks.iter().flat_map(HashMap::values) {
            sum += stats.clone();
        }
        sum
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CpuStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpu_usage: CpuUsage,
    /// Host-wide CPU time in nanoseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub system_cpu_usage: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CpuUsage {
    /// Total CPU time consumed by the container in nanoseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_usage: u64,
    /// CPU time consumed per logical core, in core order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub percpu_usage: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemoryStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub usage: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_usage: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failcnt: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: u64,
    /// The cgroup `memory.stat` breakdown.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: MemoryBreakdown,
}

/// The cgroup v1 `memory.stat` accounting breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryBreakdown {
    #[serde(deserialize_with = "null_as_default")]
    pub cache: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub rss: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub rss_huge: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub mapped_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub writeback: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pgpgin: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pgpgout: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pgfault: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pgmajfault: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub inactive_anon: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_anon: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub inactive_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub unevictable: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub hierarchical_memory_limit: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_cache: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_rss: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_rss_huge: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_mapped_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_writeback: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pgpgin: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pgpgout: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pgfault: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pgmajfault: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_inactive_anon: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_active_anon: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_inactive_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_active_file: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_unevictable: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkStats {
    #[serde(deserialize_with = "null_as_default")]
    pub rx_bytes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub rx_packets: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub rx_errors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub rx_dropped: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tx_bytes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tx_packets: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tx_errors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tx_dropped: u64,
}

impl std::ops::AddAssign for NetworkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.rx_bytes = self.rx_bytes.saturating_add(rhs.rx_bytes);
        self.rx_packets = self.rx_packets.saturating_add(rhs.rx_packets);
        self.rx_errors = self.rx_errors.saturating_add(rhs.rx_errors);
        self.rx_dropped = self.rx_dropped.saturating_add(rhs.rx_dropped);
        self.tx_bytes = self.tx_bytes.saturating_add(rhs.tx_bytes);
        self.tx_packets = self.tx_packets.saturating_add(rhs.tx_packets);
        self.tx_errors = self.tx_errors.saturating_add(rhs.tx_errors);
        self.tx_dropped = self.tx_dropped.saturating_add(rhs.tx_dropped);
    }
}

/// Block I/O counters, one entry list per blkio accounting file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BlkioStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_service_bytes_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_serviced_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_queue_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_service_time_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_wait_time_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_merged_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_time_recursive: Vec<BlkioEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sectors_recursive: Vec<BlkioEntry>,
}

/// A single `<major>:<minor> <op> <value>` blkio row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlkioEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub major: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub minor: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub op: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_document() {
        let snapshot: StatSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, StatSnapshot::default());
    }

    #[test]
    fn test_decode_ignores_cgroup_v2_memory_keys() {
        let raw = r#"{"memory_stats": {"usage": 10, "stats": {"anon": 5, "file": 7, "pgfault": 3}}}"#;
        let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.memory_stats.usage, 10);
        assert_eq!(snapshot.memory_stats.stats.pgfault, 3);
        assert_eq!(snapshot.memory_stats.stats.cache, 0);
    }

    #[test]
    fn test_decode_blkio_entries() {
        let raw = r#"{"blkio_stats": {"io_serviced_recursive": [
            {"major": 8, "minor": 0, "op": "Read", "value": 4},
            {"major": 8, "minor": 0, "op": "Write", "value": 6}
        ], "sectors_recursive": null}}"#;
        let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
        let entries = &snapshot.blkio_stats.io_serviced_recursive;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].op, "Write");
        assert_eq!(entries[1].value, 6);
    }

    #[test]
    fn test_network_totals_prefers_legacy_object() {
        let raw = r#"{
            "network": {"rx_bytes": 1},
            "networks": {"eth0": {"rx_bytes": 100}}
        }"#;
        let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.network_totals().rx_bytes, 1);
    }

    #[test]
    fn test_network_totals_sums_interfaces() {
        let raw = r#"{"networks": {
            "eth0": {"rx_bytes": 100, "tx_packets": 2},
            "eth1": {"rx_bytes": 50, "tx_packets": 3}
        }}"#;
        let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
        let totals = snapshot.network_totals();
        assert_eq!(totals.rx_bytes, 150);
        assert_eq!(totals.tx_packets, 5);
    }

    #[test]
    fn test_network_totals_saturate() {
        let raw = format!(
            r#"{{"networks": {{
                "eth0": {{"rx_bytes": {max}, "tx_dropped": 1}},
                "eth1": {{"rx_bytes": {max}, "tx_dropped": 2}}
            }}}}"#,
            max = u64::MAX
        );
        let snapshot: StatSnapshot = serde_json::from_str(&raw).unwrap();
        let totals = snapshot.network_totals();
        assert_eq!(totals.rx_bytes, u64::MAX);
        assert_eq!(totals.tx_dropped, 3);
    }
}
