use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::publisher::SeriesBackend;
use crate::runtime::{self, ContainerRuntime, RunningContainer};
use crate::tracker::Tracker;

/// Lists the running containers on every tick and syncs the tracker with them.
///
/// The first tick fires immediately. Returns `Ok(())` once `shutdown` fires.
///
/// # Errors
///
/// Listing failures are fatal and returned as is.
pub async fn run<R: ContainerRuntime, B: SeriesBackend>(
    tracker: &Tracker<R, B>,
    interval: Duration,
    debug: bool,
    shutdown: CancellationToken,
) -> runtime::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let listed = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            listed = tracker.runtime().list_running() => listed,
        };
        let running = match listed {
            Ok(running) => running,
            Err(err) => {
                log::error!(target: "reconcile", "cannot list running containers: {}", err);
                return Err(err);
            }
        };

        let running = if debug {
            debug_selection(running)
        } else {
            running
        };
        log::debug!(
            target: "reconcile",
            "reconciling: running={}, tracked={}",
            running.len(),
            tracker.len()
        );
        tracker.sync(&running);
    }
}

/// Restricts monitoring to the first listed container.
fn debug_selection(mut running: Vec<RunningContainer>) -> Vec<RunningContainer> {
    running.truncate(1);
    if let Some(container) = running.first() {
        log::info!(
            target: "reconcile",
            "running in debug mode, only container {} is monitored",
            container.id
        );
    }
    running
}
