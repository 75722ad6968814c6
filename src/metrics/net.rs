use crate::snapshot::StatSnapshot;

use super::MetricPoint;

/// Flattens the network counters of a snapshot.
///
/// Columns: `rx_dropped, rx_bytes, rx_errors, rx_packets, tx_dropped, tx_bytes, tx_errors,
/// tx_packets`. Containers with several interfaces report the sum over all of them.
pub fn to_point(series_name: String, snapshot: &StatSnapshot) -> MetricPoint {
    let net = snapshot.network_totals();
    let mut point = MetricPoint::with_capacity(series_name, 8);

    point.push("rx_dropped", net.rx_dropped);
    point.push("rx_bytes", net.rx_bytes);
    point.push("rx_errors", net.rx_errors);
    point.push("rx_packets", net.rx_packets);
    point.push("tx_dropped", net.tx_dropped);
    point.push("tx_bytes", net.tx_bytes);
    point.push("tx_errors", net.tx_errors);
    point.push("tx_packets", net.tx_packets);

    point
}
