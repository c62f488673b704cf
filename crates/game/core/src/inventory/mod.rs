//! Stacking inventory collection.
//!
//! An [`InventoryList`] is an ordered sequence of stacks; insertion order is
//! the tie-break for every "first stack" query. [`InventoryManager`] is the
//! authority-side component that adds, merges, and removes stacks and
//! publishes one stack-changed message per step. Every list mutation also
//! records an [`InventoryDelta`] so a replication adapter can forward it to
//! a [`ReplicaInventory`].

mod cost;
mod definition;
mod delta;
mod error;
mod instance;
mod list;
mod manager;
mod replica;
mod save;

pub use cost::InventoryItemCost;
pub use definition::{ItemCatalog, ItemDefinition, ItemFragment, ItemType};
pub use delta::{InventoryDelta, diff_collection};
pub use error::InventoryError;
pub use instance::ItemInstance;
pub use list::{InventoryEntry, InventoryList};
pub use manager::InventoryManager;
pub use replica::ReplicaInventory;
pub use save::{InventorySaveData, SavedStack};

use crate::ids::InstanceId;

/// Quick-access slot service consulted when an equippable item is picked up.
///
/// Failures are silent: no free slot means no assignment.
pub trait SlotAssignment {
    fn next_free_slot(&self) -> Option<usize>;

    fn assign(&mut self, index: usize, instance: InstanceId);

    fn set_active(&mut self, index: usize);

    /// True if `instance` already occupies a slot.
    fn is_assigned(&self, _instance: InstanceId) -> bool {
        false
    }
}
