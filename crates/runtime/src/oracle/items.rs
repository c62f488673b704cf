//! Minimal [`game_core::ItemCatalog`] backed by an in-memory map.
use game_core::{ItemCatalog, ItemDefId, ItemDefinition};
use std::collections::HashMap;

/// ItemCatalog implementation with static item definitions
#[derive(Debug, Clone, Default)]
pub struct ItemCatalogImpl {
    definitions: HashMap<ItemDefId, ItemDefinition>,
}

impl ItemCatalogImpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from loaded definitions. A later duplicate id
    /// replaces the earlier one.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        let mut catalog = Self::new();
        for def in definitions {
            catalog.add_definition(def);
        }
        catalog
    }

    /// Add an item definition
    pub fn add_definition(&mut self, def: ItemDefinition) {
        if let Some(previous) = self.definitions.insert(def.id.clone(), def) {
            tracing::warn!(item = %previous.id, "replaced item definition");
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ItemCatalog for ItemCatalogImpl {
    fn definition(&self, item: &ItemDefId) -> Option<ItemDefinition> {
        self.definitions.get(item).cloned()
    }

    fn all_definitions(&self) -> Vec<ItemDefinition> {
        let mut all: Vec<_> = self.definitions.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
