//! Resource ledger and stacking inventory rules shared by every host.
//!
//! `game-core` owns the canonical gameplay bookkeeping: clamped resources
//! with edge-triggered events, the death sequence, and the stacking
//! inventory with its change records. All APIs are synchronous and perform
//! no I/O. Outbound notifications go through the [`EventSink`] trait and
//! typed [`Delegate`] observer lists; the runtime crate supplies concrete
//! collaborators.
pub mod attributes;
pub mod authority;
pub mod character;
pub mod config;
pub mod death;
pub mod error;
pub mod events;
pub mod ids;
pub mod inventory;
pub mod persistence;
pub mod tags;

#[cfg(test)]
pub(crate) mod testing;

pub use attributes::{
    ActiveEffectHandle, Attribute, AttributeChange, AttributeData, AttributeEvent, CombatField,
    CombatSet, EffectContext, EffectDuration, EffectOutcome, EffectSpec, ExecutedModifier,
    Execution, LedgerError, ModOp, Modifier, ResourceField, ResourceKind, ResourceLedger,
    ResourceSet,
};
pub use authority::{AuthorityError, NetRole, ensure_authority};
pub use character::{Character, CharacterError};
pub use config::LedgerConfig;
pub use death::{DeathEvent, DeathSequence, DeathState, DeathTransition};
pub use error::{ErrorSeverity, GameError};
pub use events::{
    Delegate, EventSink, GameMessage, InventoryChangeMessage, MessageLog, NullSink,
    SubscriptionId, VerbMessage,
};
pub use ids::{EntityId, InstanceId, ItemDefId};
pub use inventory::{
    InventoryDelta, InventoryEntry, InventoryError, InventoryItemCost, InventoryList,
    InventoryManager, InventorySaveData, ItemCatalog, ItemDefinition, ItemFragment, ItemInstance,
    ItemType, ReplicaInventory, SavedStack, SlotAssignment, diff_collection,
};
pub use persistence::{LedgerSaveData, NoopPersistence, PersistenceHooks};
pub use tags::{GameplayTag, TagSet, TagStackContainer};
