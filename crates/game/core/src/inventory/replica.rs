use std::sync::Arc;

use crate::events::{EventSink, GameMessage, InventoryChangeMessage};
use crate::ids::{EntityId, InstanceId, ItemDefId};
use crate::tags;

use super::delta::InventoryDelta;
use super::instance::ItemInstance;
use super::list::InventoryEntry;

/// Read-only mirror of an authority inventory.
///
/// Stack-changed messages are derived from each entry's last observed
/// count, so transport artifacts (a "changed" record for a stack whose count
/// did not move) produce no message.
pub struct ReplicaInventory {
    owner: EntityId,
    entries: Vec<InventoryEntry>,
    sink: Arc<dyn EventSink>,
}

impl ReplicaInventory {
    pub fn new(owner: EntityId, sink: Arc<dyn EventSink>) -> Self {
        Self {
            owner,
            entries: Vec::new(),
            sink,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.entries
            .iter()
            .map(InventoryEntry::instance)
            .find(|instance| instance.id() == id)
    }

    pub fn total_item_count(&self, item: &ItemDefId) -> u64 {
        self.entries
            .iter()
            .map(InventoryEntry::instance)
            .filter(|instance| instance.definition() == item)
            .map(|instance| u64::from(instance.count()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies change records in order. Returns how many stack-changed
    /// messages were published.
    pub fn apply(&mut self, changes: &[InventoryDelta]) -> usize {
        let mut published = 0;
        for change in changes {
            if self.apply_one(change) {
                published += 1;
            }
        }
        published
    }

    fn apply_one(&mut self, change: &InventoryDelta) -> bool {
        match change {
            InventoryDelta::Removed { instance, .. } => {
                let Some(index) = self.position_of(*instance) else {
                    tracing::warn!(owner = %self.owner, %instance, "removal of unknown replicated stack");
                    return false;
                };
                let entry = self.entries.remove(index);
                self.publish(
                    *instance,
                    entry.instance.definition(),
                    0,
                    -i64::from(entry.last_observed_count),
                );
                true
            }
            InventoryDelta::Added(instance) => {
                if self.position_of(instance.id()).is_some() {
                    tracing::warn!(owner = %self.owner, id = %instance.id(), "duplicate replicated stack ignored");
                    return false;
                }
                let entry = InventoryEntry::new(instance.clone());
                let count = entry.last_observed_count;
                self.publish(instance.id(), instance.definition(), count, i64::from(count));
                self.entries.push(entry);
                true
            }
            InventoryDelta::Changed {
                instance,
                new_count,
                ..
            } => {
                let Some(index) = self.position_of(*instance) else {
                    tracing::warn!(owner = %self.owner, %instance, "change to unknown replicated stack");
                    return false;
                };
                let entry = &mut self.entries[index];
                entry.instance.set_count(*new_count);
                let last = entry.last_observed_count;
                if *new_count == last {
                    tracing::trace!(owner = %self.owner, %instance, "replicated count unchanged");
                    return false;
                }
                entry.last_observed_count = *new_count;
                let item = entry.instance.definition().clone();
                self.publish(
                    *instance,
                    &item,
                    *new_count,
                    i64::from(*new_count) - i64::from(last),
                );
                true
            }
        }
    }

    fn position_of(&self, id: InstanceId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.instance.id() == id)
    }

    fn publish(&self, instance: InstanceId, item: &ItemDefId, new_count: u32, delta: i64) {
        let message = InventoryChangeMessage {
            owner: self.owner,
            instance,
            item: item.clone(),
            new_count,
            delta,
        };
        self.sink
            .publish(&tags::INVENTORY_STACK_CHANGED, GameMessage::StackChanged(message));
    }
}
