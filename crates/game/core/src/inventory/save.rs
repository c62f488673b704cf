use crate::ids::{EntityId, ItemDefId};
use crate::tags::GameplayTag;

use super::list::InventoryList;

/// Plain snapshot of one stack for the persistence backend.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavedStack {
    pub item: ItemDefId,
    pub count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: Vec<(GameplayTag, i32)>,
}

/// Inventory contents in stack order. No byte format is implied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventorySaveData {
    pub owner: EntityId,
    pub stacks: Vec<SavedStack>,
}

impl InventorySaveData {
    pub fn from_list(list: &InventoryList) -> Self {
        Self {
            owner: list.owner(),
            stacks: list
                .instances()
                .map(|instance| SavedStack {
                    item: instance.definition().clone(),
                    count: instance.count(),
                    stats: instance
                        .stats()
                        .iter()
                        .map(|(tag, count)| (tag.clone(), count))
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
