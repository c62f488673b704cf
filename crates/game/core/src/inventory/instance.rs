use crate::ids::{InstanceId, ItemDefId};
use crate::tags::{GameplayTag, TagStackContainer};

use super::definition::{ItemDefinition, ItemType};

/// One stack of a single item definition.
///
/// `count` and `stack_limit` are typed fields; `stats` holds any other
/// gameplay counters (ammo, charges) attached by fragments.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInstance {
    id: InstanceId,
    definition: ItemDefId,
    item_type: ItemType,
    stack_limit: u32,
    count: u32,
    stats: TagStackContainer,
}

impl ItemInstance {
    /// Bare instance with no fragment setup. Inventories allocate the real id
    /// when the instance is inserted.
    pub fn new(definition: &ItemDefinition, count: u32) -> Self {
        Self {
            id: InstanceId::default(),
            definition: definition.id.clone(),
            item_type: definition.item_type,
            stack_limit: definition.stack_limit,
            count,
            stats: TagStackContainer::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn definition(&self) -> &ItemDefId {
        &self.definition
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn stack_limit(&self) -> u32 {
        self.stack_limit
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.stack_limit
    }

    pub fn spare_capacity(&self) -> u32 {
        self.stack_limit.saturating_sub(self.count)
    }

    pub fn stats(&self) -> &TagStackContainer {
        &self.stats
    }

    pub fn stat_count(&self, tag: &GameplayTag) -> i32 {
        self.stats.count(tag)
    }

    pub fn add_stat_stack(&mut self, tag: GameplayTag, count: i32) {
        self.stats.add_stack(tag, count);
    }

    pub fn remove_stat_stack(&mut self, tag: &GameplayTag, count: i32) {
        self.stats.remove_stack(tag, count);
    }

    pub(crate) fn set_id(&mut self, id: InstanceId) {
        self.id = id;
    }

    pub(crate) fn set_count(&mut self, count: u32) {
        self.count = count;
    }
}
