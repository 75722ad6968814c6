use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::routing::get;
use tokio_util::sync::CancellationToken;

use crate::publisher::SeriesBackend;
use crate::runtime::{ContainerRuntime, RunningContainer};
use crate::tracker::Tracker;

mod models;

/// Read access to the monitored containers.
pub trait ContainerDirectory: Send + Sync + 'static {
    fn containers(&self) -> Vec<RunningContainer>;
}

impl<R: ContainerRuntime, B: SeriesBackend> ContainerDirectory for Tracker<R, B> {
    fn containers(&self) -> Vec<RunningContainer> {
        self.snapshot()
    }
}

type Directory = Arc<dyn ContainerDirectory>;

async fn health() -> &'static str {
    "ok"
}

async fn list_containers(State(directory): State<Directory>) -> Json<models::ContainerList> {
    Json(models::ContainerList::sorted(directory.containers()))
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(directory: Directory) -> Self {
        let router = axum::Router::new()
            .route("/health", get(health))
            .route("/containers", get(list_containers))
            .with_state(directory);
        Self { router }
    }

    /// Serves until `shutdown` fires. A bind failure is logged and ends the server only.
    pub async fn listen(self, addr: String, shutdown: CancellationToken) {
        let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
            Ok(listener) => listener,
            Err(err) => {
                log::error!(
                    target: "api",
                    "failed to bind status API: addr={}, error={}",
                    addr,
                    err
                );
                return;
            }
        };
        log::info!(target: "api", "status API listening on {}", addr);

        if let Err(err) = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
        {
            log::error!(target: "api", "status API failed: {}", err);
        }
    }
}
