use crate::container::ContainerID;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported runtime endpoint `{0}`, expected `unix://` or `tcp://`")]
    UnsupportedEndpoint(String),
    #[error("failed to connect to runtime endpoint `{endpoint}`: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: bollard::errors::Error,
    },
    #[error("failed to list running containers: {0}")]
    List(#[source] bollard::errors::Error),
    #[error("stats subscription of container `{id}` failed: {source}")]
    Stats {
        id: ContainerID,
        #[source]
        source: bollard::errors::Error,
    },
    #[error("failed to decode stats of container `{id}`: {source}")]
    Decode {
        id: ContainerID,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
