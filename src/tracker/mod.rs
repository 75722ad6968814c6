//! Registry of monitored containers and their per-container tasks.

mod consumer;

pub use consumer::Pipeline;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::container::ContainerID;
use crate::error::ResultOkLogExt;
use crate::publisher::SeriesBackend;
use crate::runtime::{self, ContainerRuntime, RunningContainer};
use crate::snapshot::StatSnapshot;

/// A registered container. Cancelling `cancel` stops its subscription and consumer.
///
/// `closed` fires when the subscription ended on its own while the container was still
/// registered.
#[derive(Debug)]
struct TrackedContainer {
    display_name: String,
    cancel: CancellationToken,
    closed: CancellationToken,
}

/// Keeps the registry in line with the running set reported by the runtime.
///
/// [`Tracker::sync`] is the only mutator of the registry and must not be called concurrently.
pub struct Tracker<R, B> {
    registry: DashMap<ContainerID, TrackedContainer>,
    runtime: Arc<R>,
    pipeline: Arc<Pipeline<B>>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
    subscription_buffer: usize,
}

impl<R: ContainerRuntime, B: SeriesBackend> Tracker<R, B> {
    pub fn new(
        runtime: Arc<R>,
        pipeline: Pipeline<B>,
        tasks: TaskTracker,
        shutdown: CancellationToken,
        subscription_buffer: usize,
    ) -> Self {
        Self {
            registry: DashMap::default(),
            runtime,
            pipeline: Arc::new(pipeline),
            tasks,
            shutdown,
            subscription_buffer,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Starts tracking every container of `running` not yet registered and removes every
    /// registered container absent from `running`, arming its retention sweep.
    ///
    /// A registered container whose subscription has ended is subscribed again.
    pub fn sync(&self, running: &[RunningContainer]) {
        for container in running {
            match self.registry.entry(container.id.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(self.start_tracking(container));
                }
                Entry::Occupied(mut entry) if entry.get().closed.is_cancelled() => {
                    log::info!(
                        target: "tracker",
                        "subscription ended, resubscribing: container_id={}",
                        container.id
                    );
                    let stale = entry.insert(self.start_tracking(container));
                    stale.cancel.cancel();
                }
                Entry::Occupied(_) => {}
            }
        }

        let running_ids: HashSet<&ContainerID> = running.iter().map(|c| &c.id).collect();
        let departed: Vec<ContainerID> = self
            .registry
            .iter()
            .filter(|entry| !running_ids.contains(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        for id in departed {
            if let Some((id, container)) = self.registry.remove(&id) {
                self.stop_tracking(&id, container);
            }
        }
    }

    fn start_tracking(&self, container: &RunningContainer) -> TrackedContainer {
        log::info!(
            target: "tracker",
            "tracking container: container_id={}, name={}",
            container.id,
            container.display_name
        );

        let cancel = self.shutdown.child_token();
        let closed = CancellationToken::new();
        let (tx, rx) = mpsc::channel(self.subscription_buffer);
        let stream = self.runtime.subscribe(&container.id);

        self.tasks.spawn(forward(
            container.id.clone(),
            stream,
            tx,
            cancel.clone(),
            closed.clone(),
        ));
        self.tasks.spawn(consumer::consume(
            Arc::clone(&self.pipeline),
            container.clone(),
            rx,
            cancel.clone(),
        ));

        TrackedContainer {
            display_name: container.display_name.clone(),
            cancel,
            closed,
        }
    }

    fn stop_tracking(&self, id: &ContainerID, container: TrackedContainer) {
        log::info!(
            target: "tracker",
            "container gone, scheduling series retention: container_id={}, name={}",
            id,
            container.display_name
        );
        container.cancel.cancel();

        let publisher = self.pipeline.publisher().clone();
        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            publisher
                .sweep_retention(container.display_name, shutdown)
                .await
        });
    }

    /// Returns the registered containers.
    pub fn snapshot(&self) -> Vec<RunningContainer> {
        self.registry
            .iter()
            .map(|entry| RunningContainer::new(entry.key().clone(), &entry.value().display_name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains_key(id)
    }
}

/// Moves snapshots from the runtime subscription into the consumer channel.
///
/// Ends on cancellation, at the end of the stream, on the first stream error, or when the
/// consumer is gone. Unless cancelled, `closed` is fired on exit.
async fn forward(
    container_id: ContainerID,
    mut stream: BoxStream<'static, runtime::Result<StatSnapshot>>,
    tx: mpsc::Sender<StatSnapshot>,
    cancel: CancellationToken,
    closed: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = stream.next() => item,
        };

        let Some(item) = item else {
            log::info!(
                target: "tracker",
                "stats subscription closed: container_id={}",
                container_id
            );
            break;
        };
        let Some(snapshot) = item.ok_log() else {
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(snapshot) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    if !cancel.is_cancelled() {
        closed.cancel();
    }
    log::debug!(target: "tracker", "forwarder stopped: container_id={}", container_id);
}
