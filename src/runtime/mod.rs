//! Access to the container runtime: the set of running containers and their stats streams.

mod docker;
mod error;

pub use docker::DockerRuntime;
pub use error::{Error, Result};

use futures_util::stream::BoxStream;

use crate::container::{self, ContainerID};
use crate::snapshot::StatSnapshot;

/// A container as reported by the runtime's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: ContainerID,
    pub display_name: String,
}

impl RunningContainer {
    pub fn new(id: ContainerID, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Builds an entry from the raw listing fields.
    ///
    /// Returns `None`, logging a warning, if the id is missing or invalid.
    pub fn from_listing(id: Option<String>, names: Option<Vec<String>>) -> Option<Self> {
        let Some(raw_id) = id else {
            log::warn!(
                target: "runtime",
                "skipping listed container without id: names={:?}",
                names.unwrap_or_default()
            );
            return None;
        };

        match ContainerID::new(&raw_id) {
            Ok(id) => {
                let display_name = container::display_name(&id, names.as_deref().unwrap_or(&[]));
                Some(Self { id, display_name })
            }
            Err(err) => {
                log::warn!(target: "runtime", "skipping listed container: {}", err);
                None
            }
        }
    }
}

/// The runtime operations the agent consumes.
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Lists the currently running containers.
    fn list_running(&self) -> impl std::future::Future<Output = Result<Vec<RunningContainer>>> + Send;

    /// Opens a push-style stats subscription for one container.
    ///
    /// The stream ends when the container stops or the runtime closes it.
    fn subscribe(&self, id: &ContainerID) -> BoxStream<'static, Result<StatSnapshot>>;
}
