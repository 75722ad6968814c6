use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The blkio entry lists carried on a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlkioField {
    ServiceBytes,
    Serviced,
    Queue,
    ServiceTime,
    WaitTime,
    Merged,
    Time,
    Sectors,
}

impl BlkioField {
    /// Maps a blkio field name to its variant. The `_recursive` suffix Docker uses is optional.
    fn parse(name: &str) -> Option<Self> {
        let field = match name.strip_suffix("_recursive").unwrap_or(name) {
            "io_service_bytes" => Self::ServiceBytes,
            "io_serviced" => Self::Serviced,
            "io_queue" => Self::Queue,
            "io_service_time" => Self::ServiceTime,
            "io_wait_time" => Self::WaitTime,
            "io_merged" => Self::Merged,
            "io_time" => Self::Time,
            "sectors" => Self::Sectors,
            _ => return None,
        };
        Some(field)
    }
}

/// Where the data of a metric family comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyKind {
    Cpu,
    Memory,
    Network,
    /// Summed from a blkio list on the snapshot.
    Blkio(BlkioField),
    /// Summed from the named per-container accounting file.
    AccountingFile(Arc<str>),
    Unknown,
}

/// A configured metric family: its name (used as series suffix) and data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFamily {
    name: Arc<str>,
    kind: FamilyKind,
}

impl MetricFamily {
    /// Resolves a configured family name.
    ///
    /// A name listed in `accounting_files` is read from that file, even when it also names a
    /// snapshot blkio field.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # use dox_agent::metrics::{BlkioField, FamilyKind, MetricFamily};
    /// let files = HashMap::from([(
    ///     "dsk.io_serviced".to_owned(),
    ///     "blkio.throttle.io_serviced".to_owned(),
    /// )]);
    /// assert_eq!(MetricFamily::resolve("mem", &files).kind(), &FamilyKind::Memory);
    /// assert_eq!(
    ///     MetricFamily::resolve("dsk.io_merged_recursive", &files).kind(),
    ///     &FamilyKind::Blkio(BlkioField::Merged)
    /// );
    /// assert_eq!(
    ///     MetricFamily::resolve("dsk.io_serviced", &files).kind(),
    ///     &FamilyKind::AccountingFile("blkio.throttle.io_serviced".into())
    /// );
    /// ```
    pub fn resolve(name: &str, accounting_files: &HashMap<String, String>) -> Self {
        let kind = if let Some(file_name) = accounting_files.get(name) {
            FamilyKind::AccountingFile(file_name.as_str().into())
        } else {
            match name {
                "cpu" => FamilyKind::Cpu,
                "mem" => FamilyKind::Memory,
                "net" => FamilyKind::Network,
                _ => name
                    .strip_prefix("dsk.")
                    .and_then(BlkioField::parse)
                    .map_or(FamilyKind::Unknown, FamilyKind::Blkio),
            }
        };

        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FamilyKind {
        &self.kind
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin_families() {
        let files = HashMap::new();
        assert_eq!(MetricFamily::resolve("cpu", &files).kind(), &FamilyKind::Cpu);
        assert_eq!(
            MetricFamily::resolve("net", &files).kind(),
            &FamilyKind::Network
        );
        assert_eq!(
            MetricFamily::resolve("dsk.io_service_bytes", &files).kind(),
            &FamilyKind::Blkio(BlkioField::ServiceBytes)
        );
        assert_eq!(
            MetricFamily::resolve("dsk.sectors_recursive", &files).kind(),
            &FamilyKind::Blkio(BlkioField::Sectors)
        );
    }

    #[test]
    fn test_resolve_unknown_families() {
        let files = HashMap::new();
        assert_eq!(
            MetricFamily::resolve("gpu", &files).kind(),
            &FamilyKind::Unknown
        );
        assert_eq!(
            MetricFamily::resolve("dsk.bogus", &files).kind(),
            &FamilyKind::Unknown
        );
        assert_eq!(
            MetricFamily::resolve("io_serviced", &files).kind(),
            &FamilyKind::Unknown
        );
    }

    #[test]
    fn test_resolve_keeps_name() {
        let family = MetricFamily::resolve("dsk.io_queue", &HashMap::new());
        assert_eq!(family.name(), "dsk.io_queue");
        assert_eq!(family.to_string(), "dsk.io_queue");
    }
}
