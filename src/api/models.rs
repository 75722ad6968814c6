use crate::runtime::RunningContainer;

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct ContainerEntry {
    pub id: String,
    pub name: String,
}

impl From<RunningContainer> for ContainerEntry {
    fn from(container: RunningContainer) -> Self {
        Self {
            id: container.id.to_string(),
            name: container.display_name,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ContainerList {
    pub containers: Vec<ContainerEntry>,
}

impl ContainerList {
    /// Builds the listing ordered by name, then id.
    pub fn sorted(containers: Vec<RunningContainer>) -> Self {
        let mut containers: Vec<ContainerEntry> =
            containers.into_iter().map(ContainerEntry::from).collect();
        containers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Self { containers }
    }
}
