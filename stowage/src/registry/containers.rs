use indexmap::IndexMap;

use crate::types::Container;

/// Containers keyed by id. There is no removal: containers live as long as
/// the process.
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    containers: IndexMap<String, Container>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, container: Container) {
        self.containers
            .insert(container.container_id.clone(), container);
    }

    pub fn get(&self, container_id: &str) -> Option<&Container> {
        self.containers.get(container_id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(id: &str, zone: &str) -> Container {
        Container {
            container_id: id.to_string(),
            zone: zone.to_string(),
            width: 100.0,
            depth: 85.0,
            height: 200.0,
        }
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let mut registry = ContainerRegistry::new();
        registry.upsert(container("C1", "Crew"));
        registry.upsert(container("C2", "Lab"));
        registry.upsert(container("C1", "Storage"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("C1").map(|c| c.zone.as_str()), Some("Storage"));
        let order: Vec<_> = registry.iter().map(|c| c.container_id.as_str()).collect();
        assert_eq!(order, vec!["C1", "C2"]);
    }

    #[test]
    fn missing_container_is_none() {
        let registry = ContainerRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
