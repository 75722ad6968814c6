#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build backend client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("backend request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("initial ping of backend `{host}` failed: {source}")]
    InitialPing {
        host: String,
        #[source]
        source: Box<Error>,
    },
    #[error("backend unreachable after {failures} consecutive failed pings")]
    BackendLost { failures: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
