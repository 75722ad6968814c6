//! Delivery of metric points to the time-series backend.
//!
//! The [`Publisher`] wraps a [`SeriesBackend`] with the policies of the agent:
//!
//! - [`Publisher::connect`] pings once; an unreachable backend at startup is fatal.
//! - [`Publisher::push`] writes a point and drops it on failure. The next sample arrives soon.
//! - [`Publisher::health_check`] pings periodically and gives up after a run of consecutive
//!   failures, which is fatal for the agent.
//! - [`Publisher::sweep_retention`] deletes the series of a departed container after the
//!   retention window, best-effort.

mod backend;
mod error;
mod influx;

pub use backend::{SeriesBackend, TimePrecision};
pub use error::{Error, Result};
pub use influx::InfluxBackend;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::HealthCheckConfig;
use crate::metrics::{self, MetricPoint};

/// Shared handle to the backend. Cloning is cheap.
#[derive(Debug)]
pub struct Publisher<B> {
    backend: Arc<B>,
    families: Arc<[String]>,
    retention: Duration,
    health_check: HealthCheckConfig,
}

impl<B> Clone for Publisher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            families: Arc::clone(&self.families),
            retention: self.retention,
            health_check: self.health_check,
        }
    }
}

impl<B: SeriesBackend> Publisher<B> {
    /// Pings the backend once and returns a ready publisher.
    ///
    /// `families` are the metric family names whose series are deleted by the retention sweep.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitialPing`] if the backend does not answer the ping.
    pub async fn connect(
        backend: B,
        host: &str,
        families: Vec<String>,
        retention: Duration,
        health_check: HealthCheckConfig,
    ) -> Result<Self> {
        log::info!(target: "publisher", "attaching to backend {}", host);
        backend.ping().await.map_err(|source| Error::InitialPing {
            host: host.to_owned(),
            source: Box::new(source),
        })?;
        log::info!(target: "publisher", "ping of backend {} succeeded", host);

        Ok(Self {
            backend: Arc::new(backend),
            families: families.into(),
            retention,
            health_check,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Writes one point with second precision; failures are logged and the point is dropped.
    pub async fn push(&self, point: MetricPoint) {
        if point.is_empty() {
            log::debug!(
                target: "publisher",
                "skipping empty point: series={}",
                point.series_name()
            );
            return;
        }

        if let Err(err) = self
            .backend
            .write_point(&point, TimePrecision::Second)
            .await
        {
            log::error!(
                target: "publisher",
                "failed sending point: series={}, error={}",
                point.series_name(),
                err
            );
        }
    }

    /// Pings the backend on every interval until `shutdown` fires.
    ///
    /// A successful ping restores the full failure budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendLost`] once `max_failures` consecutive pings failed.
    pub async fn health_check(&self, shutdown: CancellationToken) -> Result<()> {
        let max_failures = self.health_check.max_failures;
        let mut remaining = max_failures;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.health_check.interval()) => {}
            }

            match self.backend.ping().await {
                Ok(()) => {
                    if remaining < max_failures {
                        log::info!(target: "publisher", "backend reachable again");
                    }
                    log::debug!(target: "publisher", "ping ok, backend is alive");
                    remaining = max_failures;
                }
                Err(err) => {
                    remaining = remaining.saturating_sub(1);
                    log::warn!(
                        target: "publisher",
                        "backend ping failed: remaining_attempts={}, error={}",
                        remaining,
                        err
                    );
                    if remaining == 0 {
                        return Err(Error::BackendLost {
                            failures: max_failures,
                        });
                    }
                }
            }
        }
    }

    /// Waits for the retention window, then deletes every family series of `display_name`.
    ///
    /// Deletion failures are logged and not retried. Returns early, deleting nothing, if
    /// `shutdown` fires during the wait.
    pub async fn sweep_retention(&self, display_name: String, shutdown: CancellationToken) {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log::info!(
                    target: "publisher",
                    "shutting down, series of `{}` are not deleted",
                    display_name
                );
                return;
            }
            _ = tokio::time::sleep(self.retention) => {}
        }

        for family in self.families.iter() {
            let series = metrics::series_name(&display_name, family);
            match self.backend.drop_series(&series).await {
                Ok(()) => log::info!(target: "publisher", "deleted series {}", series),
                Err(err) => log::error!(
                    target: "publisher",
                    "failed deleting series: series={}, error={}",
                    series,
                    err
                ),
            }
        }
    }
}
