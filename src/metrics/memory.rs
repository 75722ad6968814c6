use crate::snapshot::{MemoryBreakdown, StatSnapshot};

use super::MetricPoint;

type Extractor = fn(&MemoryBreakdown) -> u64;

/// Column layout of the memory breakdown part, in publishing order.
const BREAKDOWN_COLUMNS: [(&str, Extractor); 29] = [
    ("total_pgmajfault", |m| m.total_pgmajfault),
    ("cache", |m| m.cache),
    ("mapped_file", |m| m.mapped_file),
    ("total_inactive_file", |m| m.total_inactive_file),
    ("pgpgout", |m| m.pgpgout),
    ("rss", |m| m.rss),
    ("total_mapped_file", |m| m.total_mapped_file),
    ("writeback", |m| m.writeback),
    ("unevictable", |m| m.unevictable),
    ("pgpgin", |m| m.pgpgin),
    ("total_unevictable", |m| m.total_unevictable),
    ("pgmajfault", |m| m.pgmajfault),
    ("total_rss", |m| m.total_rss),
    ("total_rss_huge", |m| m.total_rss_huge),
    ("total_writeback", |m| m.total_writeback),
    ("total_inactive_anon", |m| m.total_inactive_anon),
    ("rss_huge", |m| m.rss_huge),
    ("hierarchical_memory_limit", |m| m.hierarchical_memory_limit),
    ("total_pgfault", |m| m.total_pgfault),
    ("total_active_file", |m| m.total_active_file),
    ("active_anon", |m| m.active_anon),
    ("total_active_anon", |m| m.total_active_anon),
    ("total_pgpgout", |m| m.total_pgpgout),
    ("total_cache", |m| m.total_cache),
    ("inactive_anon", |m| m.inactive_anon),
    ("active_file", |m| m.active_file),
    ("pgfault", |m| m.pgfault),
    ("inactive_file", |m| m.inactive_file),
    ("total_pgpgin", |m| m.total_pgpgin),
];

/// Number of columns of a `mem` point.
pub const COLUMN_COUNT: usize = BREAKDOWN_COLUMNS.len() + 4;

/// Flattens the memory counters of a snapshot into the fixed 33-column layout.
pub fn to_point(series_name: String, snapshot: &StatSnapshot) -> MetricPoint {
    let memory = &snapshot.memory_stats;
    let mut point = MetricPoint::with_capacity(series_name, COLUMN_COUNT);

    for (column, extract) in BREAKDOWN_COLUMNS {
        point.push(column, extract(&memory.stats));
    }
    point.push("max_usage", memory.max_usage);
    point.push("usage", memory.usage);
    point.push("failcnt", memory.failcnt);
    point.push("limit", memory.limit);

    point
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_memory_point_has_fixed_layout() {
        let point = to_point("web1.mem".into(), &StatSnapshot::default());
        assert_eq!(point.columns().len(), 33);
        assert_eq!(point.values().len(), 33);
        assert_eq!(point.columns()[0], "total_pgmajfault");
        assert_eq!(
            &point.columns()[29..],
            ["max_usage", "usage", "failcnt", "limit"]
        );
        assert!(point.values().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_memory_columns_are_unique() {
        let point = to_point("web1.mem".into(), &StatSnapshot::default());
        let unique: HashSet<&String> = point.columns().iter().collect();
        assert_eq!(unique.len(), point.columns().len());
    }

    #[test]
    fn test_memory_values() {
        let raw = r#"{"memory_stats": {
            "usage": 4096, "max_usage": 8192, "failcnt": 2, "limit": 1048576,
            "stats": {"cache": 11, "rss": 22, "total_pgmajfault": 33, "hierarchical_memory_limit": 44}
        }}"#;
        let snapshot: StatSnapshot = serde_json::from_str(raw).unwrap();
        let point = to_point("web1.mem".into(), &snapshot);
        assert_eq!(point.value("usage"), Some(4096));
        assert_eq!(point.value("max_usage"), Some(8192));
        assert_eq!(point.value("failcnt"), Some(2));
        assert_eq!(point.value("limit"), Some(1048576));
        assert_eq!(point.value("cache"), Some(11));
        assert_eq!(point.value("rss"), Some(22));
        assert_eq!(point.value("total_pgmajfault"), Some(33));
        assert_eq!(point.value("hierarchical_memory_limit"), Some(44));
        assert_eq!(point.value("pgfault"), Some(0));
    }
}
