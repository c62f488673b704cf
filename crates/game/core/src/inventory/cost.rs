use crate::ids::ItemDefId;
use crate::tags::{self, TagSet};

use super::error::InventoryError;
use super::manager::InventoryManager;

/// Ability cost paid in inventory items.
///
/// Required units are `quantity × level`, truncated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryItemCost {
    pub item: ItemDefId,
    pub quantity: f32,
}

impl InventoryItemCost {
    pub fn new(item: impl Into<ItemDefId>, quantity: f32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }

    pub fn required(&self, level: u32) -> u32 {
        let units = (self.quantity * level as f32).trunc();
        if units.is_nan() || units <= 0.0 {
            0
        } else {
            units as u32
        }
    }

    /// True if the inventory holds enough units. On failure the cost failure
    /// tag is added to `failure_tags`.
    pub fn check_cost(
        &self,
        inventory: &InventoryManager,
        level: u32,
        failure_tags: Option<&mut TagSet>,
    ) -> bool {
        let affordable = inventory.total_item_count(&self.item) >= u64::from(self.required(level));
        if !affordable {
            if let Some(failure_tags) = failure_tags {
                failure_tags.insert(tags::ABILITY_FAIL_ITEM_COST);
            }
        }
        affordable
    }

    pub fn apply_cost(
        &self,
        inventory: &mut InventoryManager,
        level: u32,
    ) -> Result<(), InventoryError> {
        let required = self.required(level);
        if required == 0 {
            return Ok(());
        }
        inventory.remove_item_definition(&self.item, required)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::authority::NetRole;
    use crate::events::NullSink;
    use crate::ids::EntityId;
    use crate::testing::{POTION, StaticCatalog};

    #[test]
    fn cost_scales_with_level() {
        let mut inventory = InventoryManager::new(
            EntityId(1),
            NetRole::Authority,
            Arc::new(StaticCatalog::standard()),
            Arc::new(NullSink),
        );
        inventory.add_item_definition(&POTION.into(), 3, None).unwrap();
        let cost = InventoryItemCost::new(POTION, 1.5);

        assert_eq!(cost.required(1), 1);
        assert_eq!(cost.required(3), 4);

        let mut failures = TagSet::new();
        assert!(!cost.check_cost(&inventory, 3, Some(&mut failures)));
        assert!(failures.has_exact(&tags::ABILITY_FAIL_ITEM_COST));
        assert!(cost.apply_cost(&mut inventory, 3).is_err());

        assert!(cost.check_cost(&inventory, 2, None));
        cost.apply_cost(&mut inventory, 2).unwrap();
        assert_eq!(inventory.total_item_count(&POTION.into()), 0);
    }
}
