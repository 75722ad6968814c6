use crate::snapshot::StatSnapshot;

use super::MetricPoint;

/// Flattens the CPU counters of a snapshot.
///
/// Columns are `cpu_total_usage`, one `cpu_<i>_usage` per logical core in the order the runtime
/// reports them, and `cpu_system_usage`, i.e. `2 + cores` in total.
pub fn to_point(series_name: String, snapshot: &StatSnapshot) -> MetricPoint {
    let usage = &snapshot.cpu_stats.cpu_usage;
    let mut point = MetricPoint::with_capacity(series_name, usage.percpu_usage.len() + 2);

    point.push("cpu_total_usage", usage.total_usage);
    for (core, value) in usage.percpu_usage.iter().enumerate() {
        point.push(format!("cpu_{core}_usage"), *value);
    }
    point.push("cpu_system_usage", snapshot.cpu_stats.system_cpu_usage);

    point
}
