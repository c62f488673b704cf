use crate::ids::{EntityId, InstanceId, ItemDefId};

use super::definition::ItemDefinition;
use super::delta::InventoryDelta;
use super::instance::ItemInstance;

/// One stack plus the count its observers last saw.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryEntry {
    pub(crate) instance: ItemInstance,
    pub(crate) last_observed_count: u32,
}

impl InventoryEntry {
    pub(crate) fn new(instance: ItemInstance) -> Self {
        let last_observed_count = instance.count();
        Self {
            instance,
            last_observed_count,
        }
    }

    pub fn instance(&self) -> &ItemInstance {
        &self.instance
    }

    pub fn last_observed_count(&self) -> u32 {
        self.last_observed_count
    }
}

/// Ordered stacks owned by one entity.
///
/// Every mutation records an [`InventoryDelta`] in a pending buffer drained
/// by [`InventoryList::take_changes`]. The buffer holds at most one record
/// per instance: later changes fold into the earlier record, and a stack
/// created and removed between drains leaves no record at all.
#[derive(Clone, Debug)]
pub struct InventoryList {
    owner: EntityId,
    entries: Vec<InventoryEntry>,
    next_id: u64,
    pending: Vec<InventoryDelta>,
}

impl InventoryList {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            entries: Vec::new(),
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn instances(&self) -> impl Iterator<Item = &ItemInstance> {
        self.entries.iter().map(InventoryEntry::instance)
    }

    /// Owned copy of every stack, in order.
    pub fn snapshot(&self) -> Vec<ItemInstance> {
        self.instances().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.instances().find(|instance| instance.id() == id)
    }

    pub fn position_of(&self, id: InstanceId) -> Option<usize> {
        self.instances().position(|instance| instance.id() == id)
    }

    /// Earliest-inserted stack of `item`.
    pub fn position_first(&self, item: &ItemDefId) -> Option<usize> {
        self.instances()
            .position(|instance| instance.definition() == item)
    }

    /// Earliest-inserted stack of `item` with spare capacity.
    pub fn position_first_not_full(&self, item: &ItemDefId) -> Option<usize> {
        self.instances()
            .position(|instance| instance.definition() == item && !instance.is_full())
    }

    /// Sum of all stacks of `item`, widened so many full stacks cannot
    /// overflow.
    pub fn total_count(&self, item: &ItemDefId) -> u64 {
        self.instances()
            .filter(|instance| instance.definition() == item)
            .map(|instance| u64::from(instance.count()))
            .sum()
    }

    /// Number of undrained change records.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn take_changes(&mut self) -> Vec<InventoryDelta> {
        std::mem::take(&mut self.pending)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Appends a new stack, running every definition fragment on it.
    pub(crate) fn create(&mut self, definition: &ItemDefinition, count: u32) -> &ItemInstance {
        let mut instance = ItemInstance::new(definition, count);
        for fragment in &definition.fragments {
            fragment.on_instance_created(&mut instance);
        }
        self.insert(instance)
    }

    /// Appends an existing instance under a freshly allocated id.
    pub(crate) fn insert(&mut self, mut instance: ItemInstance) -> &ItemInstance {
        instance.set_id(self.allocate_id());
        self.record(InventoryDelta::Added(instance.clone()));
        self.entries.push(InventoryEntry::new(instance));
        let index = self.entries.len() - 1;
        &self.entries[index].instance
    }

    /// Sets the count of the stack at `index`; returns `(old, new)`.
    pub(crate) fn set_count(&mut self, index: usize, count: u32) -> (u32, u32) {
        let entry = &mut self.entries[index];
        let old = entry.instance.count();
        entry.instance.set_count(count);
        entry.last_observed_count = count;
        let instance = entry.instance.id();
        self.record(InventoryDelta::Changed {
            instance,
            old_count: old,
            new_count: count,
        });
        (old, count)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> ItemInstance {
        let entry = self.entries.remove(index);
        self.record(InventoryDelta::Removed {
            instance: entry.instance.id(),
            old_count: entry.instance.count(),
        });
        entry.instance
    }

    /// Folds `change` into the pending record for the same instance.
    ///
    /// Ids are never reused, so an instance's records always arrive as an
    /// optional `Added`, any number of `Changed`, then an optional `Removed`.
    fn record(&mut self, change: InventoryDelta) {
        let id = change.instance();
        let Some(index) = self.pending.iter().position(|pending| pending.instance() == id) else {
            self.pending.push(change);
            return;
        };

        let merged = match (self.pending.remove(index), change) {
            (InventoryDelta::Added(mut added), InventoryDelta::Changed { new_count, .. }) => {
                added.set_count(new_count);
                Some(InventoryDelta::Added(added))
            }
            (InventoryDelta::Added(_), InventoryDelta::Removed { .. }) => None,
            (InventoryDelta::Changed { old_count, .. }, InventoryDelta::Changed { new_count, .. }) => {
                (old_count != new_count).then_some(InventoryDelta::Changed {
                    instance: id,
                    old_count,
                    new_count,
                })
            }
            (InventoryDelta::Changed { old_count, .. }, InventoryDelta::Removed { .. }) => {
                Some(InventoryDelta::Removed {
                    instance: id,
                    old_count,
                })
            }
            (previous, change) => {
                tracing::error!(owner = %self.owner, instance = %id, ?change, "out of order change record");
                self.pending.insert(index, previous);
                self.pending.push(change);
                return;
            }
        };
        if let Some(merged) = merged {
            self.pending.insert(index, merged);
        }
    }

    fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }
}
