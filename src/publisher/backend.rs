use crate::metrics::MetricPoint;

use super::Result;

/// Time precision the backend stamps written points with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePrecision {
    Second,
}

impl TimePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "s",
        }
    }
}

/// The operations the agent needs from a time-series backend.
pub trait SeriesBackend: Send + Sync + 'static {
    /// Checks whether the backend is reachable.
    fn ping(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Writes a single point; the backend assigns the timestamp.
    fn write_point(
        &self,
        point: &MetricPoint,
        precision: TimePrecision,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Deletes the series with the given name.
    fn drop_series(&self, series_name: &str)
    -> impl std::future::Future<Output = Result<()>> + Send;
}
