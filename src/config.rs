//! Agent configuration, loaded from a JSON file.
//!
//! Every key is optional; omitted keys take the defaults below. A minimal file only names the
//! backend:
//!
//! ```json
//! {
//!     "influx": { "host": "http://influx.internal:8086", "database": "dox" }
//! }
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to decode configuration `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub influx: InfluxConfig,
    /// Docker endpoint, `unix://<socket>` or `tcp://<host>:<port>`.
    pub docker_host: String,
    /// Metric families to publish, in order.
    pub metrics: Vec<String>,
    pub disk_stats: DiskStatConfig,
    pub reconcile_interval_secs: u64,
    pub health_check: HealthCheckConfig,
    /// Delay between a container disappearing and the deletion of its series.
    pub retention_secs: u64,
    pub max_inflight_publishes: usize,
    /// Capacity of each container's snapshot channel.
    pub subscription_buffer: usize,
    /// Address of the status API, `None` disables it.
    pub api_listen: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            influx: InfluxConfig::default(),
            docker_host: "unix:///var/run/docker.sock".to_owned(),
            metrics: ["cpu", "mem", "net", "dsk.io_service_bytes", "dsk.io_serviced"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            disk_stats: DiskStatConfig::default(),
            reconcile_interval_secs: 10,
            health_check: HealthCheckConfig::default(),
            retention_secs: 3600,
            max_inflight_publishes: 64,
            subscription_buffer: 16,
            api_listen: Some("127.0.0.1:9322".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8086".to_owned(),
            database: "dox".to_owned(),
            user: "root".to_owned(),
            password: "root".to_owned(),
            timeout_secs: 10,
        }
    }
}

impl InfluxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct DiskStatConfig {
    /// Directory holding the per-container blkio cgroups.
    pub base_path: PathBuf,
    /// Name of a container's cgroup directory; `{id}` is replaced by the container id.
    pub scope_template: String,
    /// Families read from accounting files, mapped to the file name.
    pub files: HashMap<String, String>,
}

impl Default for DiskStatConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("/sys/fs/cgroup/blkio/system.slice"),
            scope_template: "docker-{id}.scope".to_owned(),
            files: HashMap::from([
                (
                    "dsk.io_service_bytes".to_owned(),
                    "blkio.throttle.io_service_bytes".to_owned(),
                ),
                (
                    "dsk.io_serviced".to_owned(),
                    "blkio.throttle.io_serviced".to_owned(),
                ),
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub interval_secs: u64,
    /// Consecutive failed pings after which the backend is considered lost.
    pub max_failures: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_failures: 5,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not valid JSON, or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = fsutil::open_file_reader(path)?;
        Self::from_reader(reader, path)
    }

    /// Decodes and validates a configuration; `path` is only used for error context.
    pub fn from_reader(reader: impl Read, path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader).map_err(|source| Error::Decode {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the constraints the agent relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(Error::Invalid("`metrics` must not be empty".to_owned()));
        }
        if self.reconcile_interval_secs == 0 {
            return Err(Error::Invalid(
                "`reconcile_interval_secs` must be positive".to_owned(),
            ));
        }
        if self.health_check.interval_secs == 0 {
            return Err(Error::Invalid(
                "`health_check.interval_secs` must be positive".to_owned(),
            ));
        }
        if self.health_check.max_failures == 0 {
            return Err(Error::Invalid(
                "`health_check.max_failures` must be positive".to_owned(),
            ));
        }
        if self.max_inflight_publishes == 0 {
            return Err(Error::Invalid(
                "`max_inflight_publishes` must be positive".to_owned(),
            ));
        }
        if self.subscription_buffer == 0 {
            return Err(Error::Invalid(
                "`subscription_buffer` must be positive".to_owned(),
            ));
        }
        if !self.disk_stats.scope_template.contains("{id}") {
            return Err(Error::Invalid(format!(
                "`disk_stats.scope_template` must contain `{{id}}`, got `{}`",
                self.disk_stats.scope_template
            )));
        }
        Ok(())
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}
