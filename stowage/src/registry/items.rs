use indexmap::IndexMap;

use crate::error::{StowageError, StowageResult};
use crate::types::{Item, Position};

/// Items keyed by id; the central mutable state of the service.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: IndexMap<String, Item>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, item: Item) {
        self.items.insert(item.item_id.clone(), item);
    }

    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.items.get(item_id)
    }

    /// Case-insensitive exact name match; first hit in insertion order wins.
    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        let wanted = name.to_lowercase();
        self.items
            .values()
            .find(|item| item.name.to_lowercase() == wanted)
    }

    pub fn delete(&mut self, item_id: &str) -> Option<Item> {
        self.items.shift_remove(item_id)
    }

    pub fn increment_usage(&mut self, item_id: &str) -> StowageResult<u32> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| StowageError::UnknownItem(item_id.to_string()))?;
        item.uses = item.uses.saturating_add(1);
        Ok(item.uses)
    }

    /// Overwrite location fields. No bounds or collision checks are made
    /// against the container or its other occupants.
    pub fn set_location(
        &mut self,
        item_id: &str,
        container_id: Option<String>,
        position: Option<Position>,
    ) -> StowageResult<()> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| StowageError::UnknownItem(item_id.to_string()))?;
        item.container_id = container_id;
        item.position = position;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}
