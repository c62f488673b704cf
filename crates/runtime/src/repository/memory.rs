use std::collections::HashMap;
use std::sync::RwLock;

use game_core::{EntityId, InventorySaveData, LedgerSaveData, PersistenceHooks};

/// In-memory implementation of the persistence hooks.
///
/// Useful for tests and for carrying saves between two sessions in one
/// process.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    inventories: RwLock<HashMap<EntityId, InventorySaveData>>,
    ledgers: RwLock<HashMap<EntityId, LedgerSaveData>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(&self, owner: EntityId) -> Option<InventorySaveData> {
        self.inventories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&owner)
            .cloned()
    }

    pub fn ledger(&self, owner: EntityId) -> Option<LedgerSaveData> {
        self.ledgers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&owner)
            .copied()
    }
}

impl PersistenceHooks for InMemoryPersistence {
    fn load_inventory(&self, owner: EntityId) -> Option<InventorySaveData> {
        self.inventory(owner)
    }

    fn save_inventory(&self, owner: EntityId, data: &InventorySaveData) {
        self.inventories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(owner, data.clone());
    }

    fn load_ledger(&self, owner: EntityId) -> Option<LedgerSaveData> {
        self.ledger(owner)
    }

    fn save_ledger(&self, owner: EntityId, data: &LedgerSaveData) {
        self.ledgers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(owner, *data);
    }
}
