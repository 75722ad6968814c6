use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultOkLogExt};

/// Holds the pid file for the lifetime of the process; the file is removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Writes the current process id to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PidFile`] if the file cannot be written.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::write(&path, format!("{}\n", std::process::id())).map_err(|source| {
            Error::PidFile {
                path: path.clone(),
                source,
            }
        })?;
        log::debug!(target: "pidfile", "wrote pid file {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path)
            .map_err(|source| Error::PidFile {
                path: self.path.clone(),
                source,
            })
            .ok_log();
    }
}
