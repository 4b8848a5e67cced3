//! Zone-preference placement.
//!
//! Each item goes to the first submitted container whose zone matches its
//! preferred zone, else to the first submitted container, else nowhere. The
//! recorded box is a placeholder anchored at the origin and sized to the item;
//! container occupancy, overlap and the container's own dimensions are not
//! considered, and no rearrangement is ever proposed.

use serde::{Deserialize, Serialize};

use crate::types::{Container, Coordinates, ItemSpec, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub item_id: String,
    pub container_id: Option<String>,
    pub position: Position,
}

/// Container chosen for `item` among `containers`, in submission order.
pub fn choose_container<'a>(
    item: &ItemSpec,
    containers: &'a [Container],
) -> Option<&'a Container> {
    containers
        .iter()
        .find(|c| c.zone == item.preferred_zone)
        .or_else(|| containers.first())
}

pub fn placeholder_position(item: &ItemSpec) -> Position {
    Position {
        start: Coordinates::origin(),
        end: Coordinates::new(item.width, item.depth, item.height),
    }
}

/// Assign every item against the submitted container list (not the registry).
pub fn assign(items: &[ItemSpec], containers: &[Container]) -> Vec<Placement> {
    items
        .iter()
        .map(|item| Placement {
            item_id: item.item_id.clone(),
            container_id: choose_container(item, containers).map(|c| c.container_id.clone()),
            position: placeholder_position(item),
        })
        .collect()
}
