//! Block I/O counters read from host-exposed per-container accounting files.
//!
//! Some disk families are not carried on the runtime's stats stream. For those, the agent reads
//! the container's blkio accounting file directly, e.g.
//! `/sys/fs/cgroup/blkio/system.slice/docker-<id>.scope/blkio.throttle.io_serviced`, and sums it
//! into the same five columns the snapshot-based disk families use.
//!
//! Reading never aborts a publish cycle: a missing or unreadable file yields an all-zero point.

mod error;
mod parser;

pub use error::{Error, InvalidValue, Result};
pub use parser::{parse_accounting, parse_or_zero};

use std::path::{Path, PathBuf};

use crate::config::DiskStatConfig;
use crate::container::ContainerID;
use crate::fsutil;
use crate::metrics::{DiskTotals, MetricPoint};

/// Locates and reads per-container accounting files.
#[derive(Debug, Clone)]
pub struct DiskStatReader {
    base_path: PathBuf,
    scope_template: String,
}

impl DiskStatReader {
    pub fn new(base_path: impl Into<PathBuf>, scope_template: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            scope_template: scope_template.into(),
        }
    }

    pub fn from_config(config: &DiskStatConfig) -> Self {
        Self::new(&config.base_path, &config.scope_template)
    }

    /// Builds `<base_path>/<scope_template with {id}>/<file_name>`.
    pub fn path_for(&self, container_id: &ContainerID, file_name: &str) -> PathBuf {
        self.base_path
            .join(fsutil::expand_id_template(
                &self.scope_template,
                container_id.as_ref(),
            ))
            .join(file_name)
    }

    /// Reads and sums one accounting file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn read_totals(&self, container_id: &ContainerID, file_name: &str) -> Result<DiskTotals> {
        let path = self.path_for(container_id, file_name);
        read_file(&path)
    }

    /// Reads one accounting file into a point for `series_name`.
    ///
    /// Failures are logged and produce the five disk columns with all values zero.
    pub fn read_point(
        &self,
        container_id: &ContainerID,
        file_name: &str,
        series_name: String,
    ) -> MetricPoint {
        let totals = self
            .read_totals(container_id, file_name)
            .unwrap_or_else(|err| {
                log::error!(
                    target: "diskstat",
                    "failed reading accounting file: container_id={}, series={}, error={}",
                    container_id,
                    series_name,
                    err
                );
                DiskTotals::default()
            });
        totals.into_point(series_name)
    }
}

fn read_file(path: &Path) -> Result<DiskTotals> {
    let mut reader = fsutil::open_file_reader(path)?;
    parse_accounting(&mut reader, path)
}
