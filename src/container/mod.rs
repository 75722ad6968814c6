use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier as assigned by the container runtime.
///
/// # Examples
///
/// ```
/// # use dox_agent::container::ContainerID;
/// let raw_id = "4f1c0a9e2b7d";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), "4f1c0a9e2b7d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty, exceeds
    /// [`CONTAINER_ID_MAX_LEN`] or contains a path separator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dox_agent::container::ContainerID;
    /// assert!(ContainerID::new("abcdef012345").is_ok());
    /// assert!(ContainerID::new("").is_err());
    /// assert!(ContainerID::new("../etc").is_err());
    /// ```
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN || src.contains('/') {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the display name used as series prefix from the names the runtime reports.
///
/// Docker reports names with a leading `/`, e.g. `/web1`. The first name wins; a container
/// without any usable name falls back to its id.
///
/// # Examples
///
/// ```
/// # use dox_agent::container::{display_name, ContainerID};
/// let id = ContainerID::new("4f1c0a9e2b7d").unwrap();
/// assert_eq!(display_name(&id, &["/web1".to_owned()]), "web1");
/// assert_eq!(display_name(&id, &[]), "4f1c0a9e2b7d");
/// ```
pub fn display_name(id: &ContainerID, names: &[String]) -> String {
    names
        .iter()
        .map(|name| name.trim_start_matches('/'))
        .find(|name| !name.is_empty())
        .unwrap_or(id.as_ref())
        .to_owned()
}
