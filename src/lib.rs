//! Dox agent: tracks the running Docker containers of a host and publishes their resource
//! usage to InfluxDB.
//!
//! The reconcile loop keeps the [`tracker::Tracker`] registry in line with the runtime's
//! running set. Every tracked container gets a stats subscription whose snapshots are decoded
//! per metric family and pushed through the [`publisher::Publisher`]. Series of departed
//! containers are deleted after the retention window.
pub mod api;
pub mod config;
pub mod container;
pub mod diskstat;
pub mod error;
pub mod fsutil;
pub mod metrics;
pub mod pidfile;
pub mod publisher;
pub mod reconcile;
pub mod runtime;
pub mod snapshot;
pub mod supervisor;
pub mod tracker;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use config::Config;
use diskstat::DiskStatReader;
use metrics::{FamilyKind, MetricFamily};
use publisher::{InfluxBackend, Publisher, SeriesBackend};
use runtime::{ContainerRuntime, DockerRuntime};
use supervisor::Supervisor;
use tracker::{Pipeline, Tracker};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Monitor only the first listed container.
    pub debug: bool,
}

/// Runs the agent until a shutdown signal arrives or a fatal error occurs.
///
/// All tasks are drained before returning.
///
/// # Errors
///
/// Returns the fatal condition that stopped the agent:
/// - the backend does not answer the initial ping or is lost during the health check;
/// - the Docker endpoint is unusable or listing containers fails;
/// - signal handlers cannot be installed.
pub async fn run(config: Config, options: RunOptions) -> error::Result<()> {
    let supervisor = Supervisor::new();
    supervisor.listen_for_signals()?;

    let outcome = start(
        &config,
        options,
        supervisor.shutdown_token(),
        supervisor.tasks(),
    )
    .await;
    finish(supervisor, outcome).await
}

/// Logs a fatal outcome and drains every task of `supervisor`.
async fn finish(supervisor: Supervisor, outcome: error::Result<()>) -> error::Result<()> {
    if let Err(err) = &outcome {
        log::error!(target: "agent", "fatal: {}", err);
    }

    supervisor.shutdown().await;
    outcome
}

fn resolve_families(config: &Config) -> Vec<MetricFamily> {
    config
        .metrics
        .iter()
        .map(|name| MetricFamily::resolve(name, &config.disk_stats.files))
        .filter(|family| {
            let known = *family.kind() != FamilyKind::Unknown;
            if !known {
                log::warn!(target: "agent", "ignoring unknown metric family `{}`", family);
            }
            known
        })
        .collect()
}

async fn start(
    config: &Config,
    options: RunOptions,
    shutdown: CancellationToken,
    tasks: TaskTracker,
) -> error::Result<()> {
    let families = resolve_families(config);

    let backend = InfluxBackend::new(&config.influx)?;
    let host = backend.host().to_owned();
    let publisher = Publisher::connect(
        backend,
        &host,
        families.iter().map(|f| f.name().to_owned()).collect(),
        config.retention(),
        config.health_check,
    )
    .await?;

    let runtime = Arc::new(DockerRuntime::connect(&config.docker_host).await?);
    serve(config, options, families, publisher, runtime, shutdown, tasks).await
}

/// Runs the tracker, the status API, the health check and the reconcile loop until shutdown
/// or until the health check or the reconcile loop fails.
async fn serve<R: ContainerRuntime, B: SeriesBackend>(
    config: &Config,
    options: RunOptions,
    families: Vec<MetricFamily>,
    publisher: Publisher<B>,
    runtime: Arc<R>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
) -> error::Result<()> {
    let pipeline = Pipeline::new(
        publisher.clone(),
        families,
        DiskStatReader::from_config(&config.disk_stats),
        config.max_inflight_publishes,
        tasks.clone(),
    );
    let tracker = Arc::new(Tracker::new(
        runtime,
        pipeline,
        tasks.clone(),
        shutdown.clone(),
        config.subscription_buffer,
    ));

    if let Some(addr) = &config.api_listen {
        let server = api::APIServer::new(Arc::clone(&tracker) as Arc<dyn api::ContainerDirectory>);
        tasks.spawn(server.listen(addr.clone(), shutdown.clone()));
    }

    let health = tasks.spawn({
        let shutdown = shutdown.clone();
        async move { publisher.health_check(shutdown).await }
    });
    let reconciler = tasks.spawn({
        let interval = config.reconcile_interval();
        let shutdown = shutdown.clone();
        async move { reconcile::run(&tracker, interval, options.debug, shutdown).await }
    });
    log::info!(target: "agent", "agent started");

    tokio::select! {
        result = health => result??,
        result = reconciler => result??,
        _ = shutdown.cancelled() => {}
    }
    Ok(())
}
