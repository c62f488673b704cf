//! Item catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use game_core::ItemDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalogFile {
    pub items: Vec<ItemDefinition>,
}

/// Loader for item catalog from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load item catalog from a RON file.
    ///
    /// Rejects duplicate ids and zero stack limits.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<ItemDefinition>> {
        let catalog: ItemCatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        let mut seen = BTreeSet::new();
        for item in &catalog.items {
            anyhow::ensure!(seen.insert(item.id.clone()), "duplicate item id '{}'", item.id);
            anyhow::ensure!(
                item.stack_limit > 0,
                "item '{}' must have a stack limit of at least 1",
                item.id
            );
        }

        tracing::debug!(items = catalog.items.len(), "item catalog loaded");
        Ok(catalog.items)
    }
}
