//! Flattening of stats snapshots into named metric points.
//!
//! Every configured metric family maps one [`StatSnapshot`] to one [`MetricPoint`]: an ordered
//! list of column names and a value per column. The column layout of a family is fixed so that
//! all points of a series share the same schema.
//!
//! # Families
//!
//! - `cpu`: total usage, one column per core and host system usage ([`cpu`]).
//! - `mem`: usage, limit, failcnt, max usage and the `memory.stat` breakdown ([`memory`]).
//! - `net`: rx/tx bytes, packets, errors and drops ([`net`]).
//! - `dsk.<blkio-field>`: blkio entries summed per operation ([`blkio`]).
//! - families backed by accounting files are read by [`crate::diskstat`], not decoded here.
//!
//! Decoding never fails. Anything the decoder cannot produce data for yields an empty point,
//! which callers skip.

pub mod blkio;
pub mod cpu;
mod family;
pub mod memory;
pub mod net;

pub use blkio::{DISK_COLUMNS, DiskTotals};
pub use family::{BlkioField, FamilyKind, MetricFamily};

use crate::snapshot::StatSnapshot;

/// A flattened set of columns and values destined for one backend series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPoint {
    series_name: String,
    columns: Vec<String>,
    values: Vec<u64>,
}

impl MetricPoint {
    /// Creates an empty point for the given series.
    pub fn new(series_name: impl Into<String>) -> Self {
        Self::with_capacity(series_name, 0)
    }

    pub fn with_capacity(series_name: impl Into<String>, capacity: usize) -> Self {
        Self {
            series_name: series_name.into(),
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends a column together with its value, keeping both sequences aligned.
    pub fn push(&mut self, column: impl Into<String>, value: u64) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Returns the value of the given column, if present.
    pub fn value(&self, column: &str) -> Option<u64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builds the series name `<display_name>.<family>`.
pub fn series_name(display_name: &str, family: &str) -> String {
    format!("{display_name}.{family}")
}

/// Decodes one snapshot into the point of the given family.
///
/// Families read from accounting files and unknown families produce an empty point.
pub fn decode(kind: &FamilyKind, series_name: String, snapshot: &StatSnapshot) -> MetricPoint {
    match kind {
        FamilyKind::Cpu => cpu::to_point(series_name, snapshot),
        FamilyKind::Memory => memory::to_point(series_name, snapshot),
        FamilyKind::Network => net::to_point(series_name, snapshot),
        FamilyKind::Blkio(field) => blkio::to_point(series_name, snapshot, *field),
        FamilyKind::AccountingFile(_) | FamilyKind::Unknown => MetricPoint::new(series_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_name() {
        assert_eq!(series_name("web1", "cpu"), "web1.cpu");
        assert_eq!(
            series_name("web1", "dsk.io_serviced"),
            "web1.dsk.io_serviced"
        );
    }

    #[test]
    fn test_point_value_lookup() {
        let mut point = MetricPoint::new("web1.net");
        point.push("rx_bytes", 10);
        point.push("tx_bytes", 20);
        assert_eq!(point.value("tx_bytes"), Some(20));
        assert_eq!(point.value("rx_errors"), None);
        assert_eq!(point.len(), 2);
    }

    #[test]
    fn test_decode_unknown_family_is_empty() {
        let point = decode(
            &FamilyKind::Unknown,
            series_name("web1", "gpu"),
            &StatSnapshot::default(),
        );
        assert!(point.is_empty());
        assert_eq!(point.series_name(), "web1.gpu");
    }

    #[test]
    fn test_decode_accounting_family_is_empty() {
        let kind = FamilyKind::AccountingFile("blkio.throttle.io_serviced".into());
        let point = decode(&kind, "web1.dsk.io_serviced".into(), &StatSnapshot::default());
        assert!(point.is_empty());
    }
}
