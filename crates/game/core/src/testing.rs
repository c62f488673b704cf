//! Shared fixtures for unit tests.

use std::collections::BTreeMap;

use crate::attributes::{Attribute, Modifier};
use crate::ids::ItemDefId;
use crate::inventory::{ItemCatalog, ItemDefinition, ItemFragment, ItemType};
use crate::tags::GameplayTag;

pub const POTION: &str = "potion";
pub const MANA_POTION: &str = "mana_potion";
pub const SWORD: &str = "sword";
pub const SHARPNESS: GameplayTag = GameplayTag::from_static("Item.Stat.Sharpness");

pub fn potion() -> ItemDefinition {
    ItemDefinition::new(POTION, "Potion", ItemType::Consumable, 3)
}

pub fn mana_potion() -> ItemDefinition {
    ItemDefinition::new(MANA_POTION, "Mana Potion", ItemType::Consumable, 5).with_fragment(
        ItemFragment::ConsumeEffects {
            modifiers: vec![Modifier::add(Attribute::HEALING_MANA, 30.0)],
        },
    )
}

pub fn sword() -> ItemDefinition {
    ItemDefinition::new(SWORD, "Sword", ItemType::Weapon, 1).with_fragment(
        ItemFragment::SetStats {
            stats: vec![(SHARPNESS, 3)],
        },
    )
}

#[derive(Default)]
pub struct StaticCatalog {
    definitions: BTreeMap<ItemDefId, ItemDefinition>,
}

impl StaticCatalog {
    pub fn standard() -> Self {
        let mut catalog = Self::default();
        for definition in [potion(), mana_potion(), sword()] {
            catalog.definitions.insert(definition.id.clone(), definition);
        }
        catalog
    }

    pub fn with(mut self, definition: ItemDefinition) -> Self {
        self.definitions.insert(definition.id.clone(), definition);
        self
    }
}

impl ItemCatalog for StaticCatalog {
    fn definition(&self, id: &ItemDefId) -> Option<ItemDefinition> {
        self.definitions.get(id).cloned()
    }

    fn all_definitions(&self) -> Vec<ItemDefinition> {
        self.definitions.values().cloned().collect()
    }
}
