use crate::attributes::Modifier;
use crate::ids::ItemDefId;
use crate::tags::GameplayTag;

use super::instance::ItemInstance;

/// Item category.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemType {
    Consumable,
    Material,
    Weapon,
    Armor,
    Accessory,
    QuestItem,
    Miscellaneous,
    #[default]
    None,
}

/// Per-item setup hooks attached to a definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemFragment {
    /// Initial stat-tag stacks for every new instance.
    SetStats { stats: Vec<(GameplayTag, i32)> },
    /// Instant modifiers applied to the owner when one unit is consumed.
    ConsumeEffects { modifiers: Vec<Modifier> },
}

impl ItemFragment {
    pub(crate) fn on_instance_created(&self, instance: &mut ItemInstance) {
        match self {
            Self::SetStats { stats } => {
                for (tag, count) in stats {
                    instance.add_stat_stack(tag.clone(), *count);
                }
            }
            Self::ConsumeEffects { .. } => {}
        }
    }
}

/// Immutable static description of an item type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: ItemDefId,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub item_type: ItemType,
    /// Maximum units per stack. Must be at least 1.
    pub stack_limit: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fragments: Vec<ItemFragment>,
}

impl ItemDefinition {
    pub fn new(
        id: impl Into<ItemDefId>,
        display_name: impl Into<String>,
        item_type: ItemType,
        stack_limit: u32,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            item_type,
            stack_limit,
            fragments: Vec::new(),
        }
    }

    pub fn with_fragment(mut self, fragment: ItemFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Weapons go straight to the quick bar when picked up.
    pub fn is_equippable_on_pickup(&self) -> bool {
        self.item_type == ItemType::Weapon
    }

    /// Modifiers of every `ConsumeEffects` fragment, in definition order.
    pub fn consume_modifiers(&self) -> Vec<Modifier> {
        self.fragments
            .iter()
            .filter_map(|fragment| match fragment {
                ItemFragment::ConsumeEffects { modifiers } => Some(modifiers.iter().copied()),
                ItemFragment::SetStats { .. } => None,
            })
            .flatten()
            .collect()
    }
}

/// Read-only lookup of item definitions.
pub trait ItemCatalog: Send + Sync {
    fn definition(&self, id: &ItemDefId) -> Option<ItemDefinition>;

    /// Every definition known to the catalog.
    fn all_definitions(&self) -> Vec<ItemDefinition>;
}
