//! Save/load hooks.
//!
//! Components call these at fixed points: `load_*` once after
//! initialization, `save_*` after every successful mutation. The default
//! bodies do nothing; a backend overrides the ones it supports.

use crate::ids::EntityId;
use crate::inventory::InventorySaveData;

/// Snapshot of a ledger's persistent base values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerSaveData {
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
}

pub trait PersistenceHooks: Send + Sync {
    fn load_inventory(&self, _owner: EntityId) -> Option<InventorySaveData> {
        None
    }

    fn save_inventory(&self, _owner: EntityId, _data: &InventorySaveData) {}

    fn load_ledger(&self, _owner: EntityId) -> Option<LedgerSaveData> {
        None
    }

    fn save_ledger(&self, _owner: EntityId, _data: &LedgerSaveData) {}
}

/// Hooks with every body left empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPersistence;

impl PersistenceHooks for NoopPersistence {}
