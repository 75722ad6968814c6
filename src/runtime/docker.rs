use bollard::Docker;
use bollard::container::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;

use crate::container::ContainerID;
use crate::snapshot::StatSnapshot;

use super::{ContainerRuntime, Error, Result, RunningContainer};

/// Seconds before a request to the Docker daemon times out.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the daemon at `endpoint` and pings it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEndpoint`] for an unknown scheme and [`Error::Connect`] if the
    /// daemon cannot be reached.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let connect_err = |source| Error::Connect {
            endpoint: endpoint.to_owned(),
            source,
        };

        let connected = if let Some(socket) = endpoint.strip_prefix("unix://") {
            Docker::connect_with_unix(socket, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        } else if endpoint.starts_with("tcp://") || endpoint.starts_with("http://") {
            Docker::connect_with_http(endpoint, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        } else {
            return Err(Error::UnsupportedEndpoint(endpoint.to_owned()));
        };
        let docker = connected.map_err(connect_err)?;

        docker.ping().await.map_err(connect_err)?;
        log::info!(target: "runtime", "connected to docker daemon at {}", endpoint);

        Ok(Self { docker })
    }
}

/// Re-reads a runtime stats document into a [`StatSnapshot`].
fn decode_stats(id: &ContainerID, stats: &impl Serialize) -> Result<StatSnapshot> {
    serde_json::to_value(stats)
        .and_then(serde_json::from_value)
        .map_err(|source| Error::Decode {
            id: id.clone(),
            source,
        })
}

impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> Result<Vec<RunningContainer>> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(Error::List)?;

        Ok(summaries
            .into_iter()
            .filter_map(|summary| RunningContainer::from_listing(summary.id, summary.names))
            .collect())
    }

    fn subscribe(&self, id: &ContainerID) -> BoxStream<'static, Result<StatSnapshot>> {
        let id = id.clone();
        self.docker
            .stats(
                id.as_ref(),
                Some(StatsOptions {
                    stream: true,
                    one_shot: false,
                }),
            )
            .map(move |item| match item {
                Ok(stats) => decode_stats(&id, &stats),
                Err(source) => Err(Error::Stats {
                    id: id.clone(),
                    source,
                }),
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stats_document() {
        let id = ContainerID::new("c1").unwrap();
        let document = serde_json::json!({
            "read": "2024-01-01T00:00:00Z",
            "cpu_stats": {
                "cpu_usage": {"total_usage": 300, "percpu_usage": [100, 200]},
                "system_cpu_usage": 9000
            },
            "memory_stats": {"usage": 10, "limit": 20, "stats": null},
            "networks": {"eth0": {"rx_bytes": 5, "tx_bytes": 6}},
            "blkio_stats": {"io_service_bytes_recursive": null}
        });

        let snapshot = decode_stats(&id, &document).unwrap();
        assert_eq!(snapshot.cpu_stats.cpu_usage.percpu_usage, [100, 200]);
        assert_eq!(snapshot.cpu_stats.system_cpu_usage, 9000);
        assert_eq!(snapshot.memory_stats.limit, 20);
        assert_eq!(snapshot.network_totals().tx_bytes, 6);
        assert!(snapshot.blkio_stats.io_service_bytes_recursive.is_empty());
    }

    #[test]
    fn test_decode_stats_rejects_wrong_types() {
        let id = ContainerID::new("c1").unwrap();
        let document = serde_json::json!({"cpu_stats": {"system_cpu_usage": "lots"}});
        let err = decode_stats(&id, &document).unwrap_err();
        assert!(matches!(err, Error::Decode { id, .. } if id.as_ref() == "c1"));
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let err = DockerRuntime::connect("npipe:////./pipe/docker_engine")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEndpoint(_)));
    }
}
