use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use dox_agent::fsutil;
/// let reader = fsutil::open_file_reader("/sys/fs/cgroup/blkio/blkio.throttle.io_serviced")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Replaces every `{id}` placeholder of `template` with `id`.
///
/// ```
/// # use dox_agent::fsutil::expand_id_template;
/// assert_eq!(expand_id_template("docker-{id}.scope", "abc"), "docker-abc.scope");
/// ```
pub fn expand_id_template(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}
