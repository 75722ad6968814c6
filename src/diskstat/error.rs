//! Error types of the disk accounting reader.
//!
//! None of these escape a publish cycle: the reader logs them and falls back to zero.

use std::num::ParseIntError;
use std::path::PathBuf;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A numeric field of an accounting line that is not an unsigned integer.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for '{operation}' at line {line}: '{value}': {source}")]
pub struct InvalidValue {
    pub operation: String,
    pub value: String,
    pub line: usize,
    #[source]
    pub source: ParseIntError,
}
