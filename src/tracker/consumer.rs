use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::container::ContainerID;
use crate::diskstat::DiskStatReader;
use crate::metrics::{self, FamilyKind, MetricFamily};
use crate::publisher::{Publisher, SeriesBackend};
use crate::runtime::RunningContainer;
use crate::snapshot::StatSnapshot;

/// Everything needed to turn a snapshot into published points.
///
/// Publish tasks run on `tasks` and at most `max_inflight` of them are in flight at once.
#[derive(Debug)]
pub struct Pipeline<B> {
    publisher: Publisher<B>,
    families: Arc<[MetricFamily]>,
    disk_stats: Arc<DiskStatReader>,
    permits: Arc<Semaphore>,
    tasks: TaskTracker,
}

impl<B: SeriesBackend> Pipeline<B> {
    pub fn new(
        publisher: Publisher<B>,
        families: Vec<MetricFamily>,
        disk_stats: DiskStatReader,
        max_inflight: usize,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            publisher,
            families: families.into(),
            disk_stats: Arc::new(disk_stats),
            permits: Arc::new(Semaphore::new(max_inflight)),
            tasks,
        }
    }

    pub fn publisher(&self) -> &Publisher<B> {
        &self.publisher
    }

    async fn publish_family(
        &self,
        family: &MetricFamily,
        container_id: &ContainerID,
        display_name: &str,
        snapshot: &StatSnapshot,
    ) {
        let series_name = metrics::series_name(display_name, family.name());
        let point = match family.kind() {
            FamilyKind::AccountingFile(file_name) => {
                let reader = Arc::clone(&self.disk_stats);
                let container_id = container_id.clone();
                let file_name = Arc::clone(file_name);
                let read = tokio::task::spawn_blocking(move || {
                    reader.read_point(&container_id, &file_name, series_name)
                });
                match read.await {
                    Ok(point) => point,
                    Err(err) => {
                        log::error!(
                            target: "consumer",
                            "accounting file reader failed: family={}, error={}",
                            family,
                            err
                        );
                        return;
                    }
                }
            }
            kind => metrics::decode(kind, series_name, snapshot),
        };

        self.publisher.push(point).await;
    }
}

/// Fans every received snapshot out into one publish task per family.
///
/// Ends when the channel closes or `cancel` fires. Waits for a publish permit before each
/// spawn, which back-pressures the channel.
pub(super) async fn consume<B: SeriesBackend>(
    pipeline: Arc<Pipeline<B>>,
    container: RunningContainer,
    mut rx: mpsc::Receiver<StatSnapshot>,
    cancel: CancellationToken,
) {
    let display_name: Arc<str> = container.display_name.into();

    loop {
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => break,
            snapshot = rx.recv() => match snapshot {
                Some(snapshot) => Arc::new(snapshot),
                None => break,
            },
        };
        log::trace!(
            target: "consumer",
            "received snapshot: container_id={}",
            container.id
        );

        for family in pipeline.families.iter() {
            let permit = tokio::select! {
                _ = cancel.cancelled() => return,
                permit = Arc::clone(&pipeline.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            let task_pipeline = Arc::clone(&pipeline);
            let family = family.clone();
            let container_id = container.id.clone();
            let display_name = Arc::clone(&display_name);
            let snapshot = Arc::clone(&snapshot);
            pipeline.tasks.spawn(async move {
                let _permit = permit;
                task_pipeline
                    .publish_family(&family, &container_id, &display_name, &snapshot)
                    .await;
            });
        }
    }
    log::debug!(target: "consumer", "consumer stopped: container_id={}", container.id);
}
