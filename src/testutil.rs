//! In-memory runtime and backend doubles.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;

use crate::container::ContainerID;
use crate::metrics::MetricPoint;
use crate::publisher::{self, SeriesBackend, TimePrecision};
use crate::runtime::{self, ContainerRuntime, RunningContainer};
use crate::snapshot::StatSnapshot;

pub fn running(id: &str, name: &str) -> RunningContainer {
    RunningContainer::new(ContainerID::new(id).unwrap(), name)
}

fn backend_error() -> publisher::Error {
    publisher::Error::Status {
        status: 503,
        body: "unavailable".to_owned(),
    }
}

#[derive(Debug, Default)]
struct BackendState {
    scripted_pings: VecDeque<bool>,
    fail_pings: bool,
    fail_writes: bool,
    fail_drops: bool,
    ping_count: usize,
    write_attempts: usize,
    writes: Vec<MetricPoint>,
    drop_attempts: usize,
    dropped: Vec<String>,
}

/// Records every call; pings consume the scripted outcomes first.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    fn state(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn script_pings(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.state().scripted_pings.extend(outcomes);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.state().fail_pings = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn fail_drops(&self, fail: bool) {
        self.state().fail_drops = fail;
    }

    pub fn ping_count(&self) -> usize {
        self.state().ping_count
    }

    pub fn write_attempts(&self) -> usize {
        self.state().write_attempts
    }

    pub fn writes(&self) -> Vec<MetricPoint> {
        self.state().writes.clone()
    }

    pub fn drop_attempts(&self) -> usize {
        self.state().drop_attempts
    }

    pub fn dropped(&self) -> Vec<String> {
        self.state().dropped.clone()
    }
}

impl SeriesBackend for MockBackend {
    async fn ping(&self) -> publisher::Result<()> {
        let mut state = self.state();
        state.ping_count += 1;
        let ok = state
            .scripted_pings
            .pop_front()
            .unwrap_or(!state.fail_pings);
        if ok { Ok(()) } else { Err(backend_error()) }
    }

    async fn write_point(
        &self,
        point: &MetricPoint,
        precision: TimePrecision,
    ) -> publisher::Result<()> {
        assert_eq!(precision, TimePrecision::Second);
        let mut state = self.state();
        state.write_attempts += 1;
        if state.fail_writes {
            return Err(backend_error());
        }
        state.writes.push(point.clone());
        Ok(())
    }

    async fn drop_series(&self, series_name: &str) -> publisher::Result<()> {
        let mut state = self.state();
        state.drop_attempts += 1;
        if state.fail_drops {
            return Err(backend_error());
        }
        state.dropped.push(series_name.to_owned());
        Ok(())
    }
}

type SnapshotSender = mpsc::UnboundedSender<runtime::Result<StatSnapshot>>;

#[derive(Debug, Default)]
struct RuntimeState {
    running: Vec<RunningContainer>,
    fail_list: bool,
    list_calls: usize,
    subscriptions: HashMap<String, usize>,
    senders: HashMap<String, SnapshotSender>,
}

/// Serves a configurable listing; each subscription is fed through [`MockRuntime::emit`].
#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    state: Arc<Mutex<RuntimeState>>,
}

impl MockRuntime {
    fn state(&self) -> std::sync::MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap()
    }

    pub fn set_running(&self, running: Vec<RunningContainer>) {
        self.state().running = running;
    }

    pub fn fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub fn subscriptions(&self, id: &str) -> usize {
        self.state().subscriptions.get(id).copied().unwrap_or_default()
    }

    /// Pushes an item into the latest subscription of `id`.
    pub fn emit(&self, id: &str, item: runtime::Result<StatSnapshot>) {
        let state = self.state();
        let sender = state.senders.get(id).expect("container is subscribed");
        sender.send(item).expect("subscription is open");
    }

    /// Ends the latest subscription of `id`.
    pub fn close(&self, id: &str) {
        self.state().senders.remove(id);
    }
}

impl ContainerRuntime for MockRuntime {
    async fn list_running(&self) -> runtime::Result<Vec<RunningContainer>> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_list {
            return Err(runtime::Error::List(
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 500,
                    message: "daemon unavailable".to_owned(),
                },
            ));
        }
        Ok(state.running.clone())
    }

    fn subscribe(&self, id: &ContainerID) -> BoxStream<'static, runtime::Result<StatSnapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        *state.subscriptions.entry(id.to_string()).or_default() += 1;
        state.senders.insert(id.to_string(), tx);

        futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed()
    }
}
