use crate::snapshot::{BlkioEntry, StatSnapshot};

use super::{BlkioField, MetricPoint};

/// Column layout shared by all disk families.
pub const DISK_COLUMNS: [&str; 5] = ["read", "write", "sync", "async", "total"];

/// Per-operation sums of block I/O counters, in [`DISK_COLUMNS`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskTotals([u64; 5]);

impl DiskTotals {
    /// Adds `value` to the column of the given operation.
    ///
    /// Operations are matched case-insensitively. Returns `false`, leaving the totals untouched,
    /// for operations outside of [`DISK_COLUMNS`].
    pub fn add(&mut self, operation: &str, value: u64) -> bool {
        match DISK_COLUMNS
            .iter()
            .position(|column| column.eq_ignore_ascii_case(operation))
        {
            Some(idx) => {
                self.0[idx] = self.0[idx].saturating_add(value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, column: &str) -> Option<u64> {
        DISK_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.0[idx])
    }

    pub fn into_point(self, series_name: String) -> MetricPoint {
        let mut point = MetricPoint::with_capacity(series_name, DISK_COLUMNS.len());
        for (column, value) in DISK_COLUMNS.iter().zip(self.0) {
            point.push(*column, value);
        }
        point
    }
}

impl<'a> FromIterator<&'a BlkioEntry> for DiskTotals {
    fn from_iter<T: IntoIterator<Item = &'a BlkioEntry>>(iter: T) -> Self {
        let mut totals = Self::default();
        for entry in iter {
            totals.add(&entry.op, entry.value);
        }
        totals
    }
}

fn entries(snapshot: &StatSnapshot, field: BlkioField) -> &[BlkioEntry] {
    let stats = &snapshot.blkio_stats;
    match field {
        BlkioField::ServiceBytes => &stats.io_service_bytes_recursive,
        BlkioField::Serviced => &stats.io_serviced_recursive,
        BlkioField::Queue => &stats.io_queue_recursive,
        BlkioField::ServiceTime => &stats.io_service_time_recursive,
        BlkioField::WaitTime => &stats.io_wait_time_recursive,
        BlkioField::Merged => &stats.io_merged_recursive,
        BlkioField::Time => &stats.io_time_recursive,
        BlkioField::Sectors => &stats.sectors_recursive,
    }
}

/// Sums the entries of one blkio list by operation into the five disk columns.
pub fn to_point(series_name: String, snapshot: &StatSnapshot, field: BlkioField) -> MetricPoint {
    entries(snapshot, field)
        .iter()
        .collect::<DiskTotals>()
        .into_point(series_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: &str, value: u64) -> BlkioEntry {
        BlkioEntry {
            major: 8,
            minor: 0,
            op: op.to_owned(),
            value,
        }
    }

    #[test]
    fn test_blkio_sums_per_operation() {
        let mut snapshot = StatSnapshot::default();
        snapshot.blkio_stats.io_service_bytes_recursive = vec![
            entry("Read", 10),
            entry("Write", 1),
            entry("Read", 20),
            entry("Sync", 2),
            entry("Async", 3),
            entry("Read", 30),
            entry("Total", 66),
        ];
        let point = to_point("web1.dsk.io_service_bytes".into(), &snapshot, BlkioField::ServiceBytes);
        assert_eq!(point.columns(), DISK_COLUMNS);
        assert_eq!(point.values(), [60, 1, 2, 3, 66]);
    }

    #[test]
    fn test_blkio_ignores_unknown_operations() {
        let mut snapshot = StatSnapshot::default();
        snapshot.blkio_stats.io_serviced_recursive =
            vec![entry("Discard", 99), entry("Write", 4), entry("", 7)];
        let point = to_point("c.dsk".into(), &snapshot, BlkioField::Serviced);
        assert_eq!(point.values(), [0, 4, 0, 0, 0]);
    }

    #[test]
    fn test_blkio_matches_lowercase_operations() {
        let mut snapshot = StatSnapshot::default();
        snapshot.blkio_stats.io_service_bytes_recursive = vec![entry("read", 5), entry("write", 6)];
        let point = to_point("c.dsk".into(), &snapshot, BlkioField::ServiceBytes);
        assert_eq!(point.values(), [5, 6, 0, 0, 0]);
    }

    #[test]
    fn test_blkio_reads_selected_field_only() {
        let mut snapshot = StatSnapshot::default();
        snapshot.blkio_stats.io_serviced_recursive = vec![entry("Read", 5)];
        let point = to_point("c.dsk".into(), &snapshot, BlkioField::Sectors);
        assert_eq!(point.values(), [0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_disk_totals_add() {
        let mut totals = DiskTotals::default();
        assert!(totals.add("ASYNC", 7));
        assert!(!totals.add("discard", 7));
        assert_eq!(totals.get("async"), Some(7));
        assert_eq!(totals.get("bogus"), None);
    }
}
