use std::sync::Arc;

use crate::authority::{NetRole, ensure_authority};
use crate::events::{EventSink, GameMessage, InventoryChangeMessage};
use crate::ids::{EntityId, InstanceId, ItemDefId};
use crate::persistence::{NoopPersistence, PersistenceHooks};
use crate::tags;

use super::SlotAssignment;
use super::definition::{ItemCatalog, ItemDefinition, ItemType};
use super::delta::InventoryDelta;
use super::error::InventoryError;
use super::instance::ItemInstance;
use super::list::InventoryList;
use super::save::InventorySaveData;

/// Authority-side inventory component.
///
/// Mutators are all-or-nothing: an `Err` means no stack changed and no
/// message was published. Successful mutators publish one stack-changed
/// message per step, in the order the stacks changed, then save.
pub struct InventoryManager {
    role: NetRole,
    list: InventoryList,
    catalog: Arc<dyn ItemCatalog>,
    sink: Arc<dyn EventSink>,
    persistence: Arc<dyn PersistenceHooks>,
}

impl InventoryManager {
    pub fn new(
        owner: EntityId,
        role: NetRole,
        catalog: Arc<dyn ItemCatalog>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            role,
            list: InventoryList::new(owner),
            catalog,
            sink,
            persistence: Arc::new(NoopPersistence),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceHooks>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn owner(&self) -> EntityId {
        self.list.owner()
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn list(&self) -> &InventoryList {
        &self.list
    }

    pub fn catalog(&self) -> &dyn ItemCatalog {
        self.catalog.as_ref()
    }

    /// Drains the change records produced since the last call.
    pub fn take_changes(&mut self) -> Vec<InventoryDelta> {
        self.list.take_changes()
    }

    /// Loads persisted stacks. Returns how many stacks were restored.
    pub fn initialize(&mut self) -> usize {
        let owner = self.owner();
        let Some(data) = self.persistence.load_inventory(owner) else {
            tracing::debug!(%owner, "no saved inventory");
            return 0;
        };

        let mut restored = 0;
        for saved in data.stacks {
            let Some(definition) = self.catalog.definition(&saved.item) else {
                tracing::error!(%owner, item = %saved.item, "saved stack references unknown item");
                continue;
            };
            let count = saved.count.min(definition.stack_limit);
            if count == 0 {
                continue;
            }
            let mut instance = ItemInstance::new(&definition, count);
            for (tag, stacks) in saved.stats {
                instance.add_stat_stack(tag, stacks);
            }
            self.list.insert(instance);
            restored += 1;
        }
        tracing::info!(%owner, restored, "inventory restored");
        restored
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Adds `count` units of `item`, topping up existing stacks in insertion
    /// order before creating new ones.
    ///
    /// Returns the last created or topped-up stack (`None` for `count == 0`).
    /// A newly acquired equippable item is placed in the first free slot
    /// and made active.
    pub fn add_item_definition(
        &mut self,
        item: &ItemDefId,
        count: u32,
        slots: Option<&mut dyn SlotAssignment>,
    ) -> Result<Option<InstanceId>, InventoryError> {
        ensure_authority(self.role, self.owner(), "add_item_definition")?;
        let definition = self.resolve(item)?;
        if definition.stack_limit == 0 {
            tracing::error!(owner = %self.owner(), %item, "item definition has zero stack limit");
            return Err(InventoryError::InvalidStackLimit { item: item.clone() });
        }
        if count == 0 {
            return Ok(None);
        }

        let mut remaining = count;
        let mut result = None;

        while remaining > 0 {
            let Some(index) = self.list.position_first_not_full(item) else {
                break;
            };
            let instance = &self.list.entries()[index].instance;
            let added = instance.spare_capacity().min(remaining);
            let id = instance.id();
            let topped_up = instance.count() + added;
            let (_, new_count) = self.list.set_count(index, topped_up);
            self.publish(id, item, new_count, i64::from(added));
            remaining -= added;
            result = Some(id);
        }

        while remaining > 0 {
            let chunk = remaining.min(definition.stack_limit);
            let id = self.list.create(&definition, chunk).id();
            self.publish(id, item, chunk, i64::from(chunk));
            remaining -= chunk;
            result = Some(id);
        }

        if let (Some(id), Some(slots)) = (result, slots) {
            if definition.is_equippable_on_pickup() {
                self.assign_slot(slots, id);
            }
        }

        tracing::debug!(owner = %self.owner(), %item, count, "items added");
        self.save();
        Ok(result)
    }

    /// Removes exactly `count` units of `item`, or nothing at all.
    ///
    /// Stacks are drained in insertion order; a drained stack leaves the
    /// list instead of lingering at zero.
    pub fn remove_item_definition(
        &mut self,
        item: &ItemDefId,
        count: u32,
    ) -> Result<(), InventoryError> {
        ensure_authority(self.role, self.owner(), "remove_item_definition")?;
        let available = self.list.total_count(item);
        if available < u64::from(count) {
            tracing::warn!(
                owner = %self.owner(),
                %item,
                requested = count,
                available,
                "not enough items to remove"
            );
            return Err(InventoryError::InsufficientItems {
                item: item.clone(),
                requested: count,
                available,
            });
        }
        if count == 0 {
            return Ok(());
        }

        let mut remaining = count;
        while remaining > 0 {
            let Some(index) = self.list.position_first(item) else {
                break;
            };
            let instance = &self.list.entries()[index].instance;
            let current = instance.count();
            let id = instance.id();
            let taken = current.min(remaining);

            if taken == current {
                self.list.remove_at(index);
                self.publish(id, item, 0, -i64::from(taken));
            } else {
                let (_, new_count) = self.list.set_count(index, current - taken);
                self.publish(id, item, new_count, -i64::from(taken));
            }
            remaining -= taken;
        }

        tracing::debug!(owner = %self.owner(), %item, count, "items removed");
        self.save();
        Ok(())
    }

    /// Takes ownership of an existing instance (e.g. a transfer). The
    /// instance gets a new id from this inventory.
    ///
    /// Empty instances and instances over the stack limit are rejected. The
    /// catalog's limit wins over the one the instance carries.
    pub fn add_item_instance(&mut self, instance: ItemInstance) -> Result<InstanceId, InventoryError> {
        ensure_authority(self.role, self.owner(), "add_item_instance")?;
        let item = instance.definition().clone();
        let count = instance.count();
        let stack_limit = self
            .catalog
            .definition(&item)
            .map_or(instance.stack_limit(), |definition| definition.stack_limit);
        if count == 0 || count > stack_limit {
            tracing::warn!(owner = %self.owner(), %item, count, stack_limit, "rejected instance outside stack bounds");
            return Err(InventoryError::InvalidStackCount {
                item,
                count,
                stack_limit,
            });
        }
        let id = self.list.insert(instance).id();
        self.publish(id, &item, count, i64::from(count));
        self.save();
        Ok(id)
    }

    pub fn remove_item_instance(&mut self, id: InstanceId) -> Result<ItemInstance, InventoryError> {
        ensure_authority(self.role, self.owner(), "remove_item_instance")?;
        let index = self
            .list
            .position_of(id)
            .ok_or(InventoryError::UnknownInstance(id))?;
        let instance = self.list.remove_at(index);
        self.publish(
            id,
            instance.definition(),
            0,
            -i64::from(instance.count()),
        );
        self.save();
        Ok(instance)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Sum of all stacks of `item`.
    pub fn total_item_count(&self, item: &ItemDefId) -> u64 {
        self.list.total_count(item)
    }

    /// Number of stacks of `item`.
    pub fn stack_count_by_definition(&self, item: &ItemDefId) -> usize {
        self.list
            .instances()
            .filter(|instance| instance.definition() == item)
            .count()
    }

    pub fn find_first_stack(&self, item: &ItemDefId) -> Option<&ItemInstance> {
        self.list
            .position_first(item)
            .map(|index| self.list.entries()[index].instance())
    }

    pub fn find_first_stack_not_full(&self, item: &ItemDefId) -> Option<&ItemInstance> {
        self.list
            .position_first_not_full(item)
            .map(|index| self.list.entries()[index].instance())
    }

    pub fn instance(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.list.get(id)
    }

    /// True when the catalog knows `item` and its stacks can hold units.
    pub fn can_add_item_definition(&self, item: &ItemDefId) -> bool {
        self.catalog
            .definition(item)
            .is_some_and(|definition| definition.stack_limit > 0)
    }

    pub fn all_items(&self) -> Vec<&ItemInstance> {
        self.list.instances().collect()
    }

    /// Non-empty stacks of the given category.
    pub fn all_items_of_type(&self, item_type: ItemType) -> Vec<&ItemInstance> {
        self.list
            .instances()
            .filter(|instance| instance.item_type() == item_type && instance.count() > 0)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn save_data(&self) -> InventorySaveData {
        InventorySaveData::from_list(&self.list)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn resolve(&self, item: &ItemDefId) -> Result<ItemDefinition, InventoryError> {
        self.catalog.definition(item).ok_or_else(|| {
            tracing::error!(owner = %self.owner(), %item, "item definition missing from catalog");
            InventoryError::UnknownItem(item.clone())
        })
    }

    fn assign_slot(&self, slots: &mut dyn SlotAssignment, id: InstanceId) {
        if slots.is_assigned(id) {
            return;
        }
        match slots.next_free_slot() {
            Some(index) => {
                slots.assign(index, id);
                slots.set_active(index);
                tracing::debug!(owner = %self.owner(), %id, index, "equippable assigned to slot");
            }
            None => tracing::trace!(owner = %self.owner(), %id, "no free slot for equippable"),
        }
    }

    fn publish(&self, instance: InstanceId, item: &ItemDefId, new_count: u32, delta: i64) {
        let message = InventoryChangeMessage {
            owner: self.owner(),
            instance,
            item: item.clone(),
            new_count,
            delta,
        };
        tracing::trace!(owner = %message.owner, %instance, new_count, delta, "stack changed");
        self.sink
            .publish(&tags::INVENTORY_STACK_CHANGED, GameMessage::StackChanged(message));
    }

    fn save(&self) {
        self.persistence
            .save_inventory(self.owner(), &self.save_data());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::events::MessageLog;
    use crate::inventory::diff_collection;
    use crate::testing::{POTION, SWORD, StaticCatalog, potion, sword};

    fn manager() -> (InventoryManager, Arc<MessageLog>) {
        let log = Arc::new(MessageLog::new());
        let manager = InventoryManager::new(
            EntityId(1),
            NetRole::Authority,
            Arc::new(StaticCatalog::standard()),
            log.clone(),
        );
        (manager, log)
    }

    fn stack_changes(log: &MessageLog) -> Vec<(u32, i64)> {
        log.take()
            .into_iter()
            .filter_map(|(_, message)| match message {
                GameMessage::StackChanged(change) => Some((change.new_count, change.delta)),
                GameMessage::Verb(_) => None,
            })
            .collect()
    }

    fn counts(manager: &InventoryManager) -> Vec<u32> {
        manager.all_items().iter().map(|i| i.count()).collect()
    }

    #[derive(Default)]
    struct Slots {
        assigned: Vec<(usize, InstanceId)>,
        active: Option<usize>,
        capacity: usize,
    }

    impl SlotAssignment for Slots {
        fn next_free_slot(&self) -> Option<usize> {
            (self.assigned.len() < self.capacity).then_some(self.assigned.len())
        }

        fn assign(&mut self, index: usize, instance: InstanceId) {
            self.assigned.push((index, instance));
        }

        fn set_active(&mut self, index: usize) {
            self.active = Some(index);
        }

        fn is_assigned(&self, instance: InstanceId) -> bool {
            self.assigned.iter().any(|(_, id)| *id == instance)
        }
    }

    #[test]
    fn add_splits_into_stacks_in_creation_order() {
        let (mut inventory, log) = manager();

        inventory
            .add_item_definition(&POTION.into(), 5, None)
            .unwrap();

        assert_eq!(counts(&inventory), vec![3, 2]);
        assert_eq!(stack_changes(&log), vec![(3, 3), (2, 2)]);
    }

    #[test]
    fn add_tops_up_before_creating() {
        let (mut inventory, log) = manager();
        let potion_id = ItemDefId::from(POTION);
        inventory.add_item_definition(&potion_id, 3, None).unwrap();
        inventory.add_item_definition(&potion_id, 1, None).unwrap();
        log.take();

        let merged = inventory.add_item_definition(&potion_id, 2, None).unwrap();

        assert_eq!(counts(&inventory), vec![3, 3]);
        assert_eq!(merged, Some(inventory.all_items()[1].id()));
        assert_eq!(stack_changes(&log), vec![(3, 2)]);
    }

    #[test]
    fn remove_drains_stacks_in_insertion_order() {
        let (mut inventory, log) = manager();
        let def = potion();
        inventory.add_item_instance(ItemInstance::new(&def, 2)).unwrap();
        inventory.add_item_instance(ItemInstance::new(&def, 3)).unwrap();
        log.take();

        inventory.remove_item_definition(&def.id, 4).unwrap();

        assert_eq!(counts(&inventory), vec![1]);
        assert_eq!(stack_changes(&log), vec![(0, -2), (1, -2)]);
        assert_eq!(inventory.stack_count_by_definition(&def.id), 1);
    }

    #[test]
    fn remove_more_than_available_changes_nothing() {
        let (mut inventory, log) = manager();
        let def = potion();
        inventory.add_item_instance(ItemInstance::new(&def, 2)).unwrap();
        inventory.add_item_instance(ItemInstance::new(&def, 2)).unwrap();
        inventory.take_changes();
        log.take();

        let err = inventory.remove_item_definition(&def.id, 10).unwrap_err();

        assert_eq!(
            err,
            InventoryError::InsufficientItems {
                item: def.id.clone(),
                requested: 10,
                available: 4
            }
        );
        assert_eq!(counts(&inventory), vec![2, 2]);
        assert!(log.is_empty());
        assert!(inventory.take_changes().is_empty());
    }

    #[test]
    fn add_then_remove_conserves_total() {
        let potion_id = ItemDefId::from(POTION);
        for start in 0..5 {
            for n in 0..8 {
                let (mut inventory, _) = manager();
                inventory.add_item_definition(&potion_id, start, None).unwrap();
                let before = inventory.total_item_count(&potion_id);

                inventory.add_item_definition(&potion_id, n, None).unwrap();
                inventory.remove_item_definition(&potion_id, n).unwrap();

                assert_eq!(inventory.total_item_count(&potion_id), before, "start={start} n={n}");
            }
        }
    }

    #[test]
    fn stacks_never_exceed_limit() {
        let (mut inventory, _) = manager();
        let potion_id = ItemDefId::from(POTION);
        for n in [1, 4, 2, 7, 3, 1] {
            inventory.add_item_definition(&potion_id, n, None).unwrap();
            assert!(inventory.all_items().iter().all(|i| i.count() <= 3));
        }
        assert_eq!(inventory.total_item_count(&potion_id), 18);
        assert!(inventory.find_first_stack_not_full(&potion_id).is_none());
    }

    #[test]
    fn weapon_pickup_takes_first_free_slot() {
        let (mut inventory, _) = manager();
        let mut slots = Slots {
            capacity: 1,
            ..Slots::default()
        };

        let first = inventory
            .add_item_definition(&SWORD.into(), 1, Some(&mut slots))
            .unwrap()
            .unwrap();
        inventory
            .add_item_definition(&SWORD.into(), 1, Some(&mut slots))
            .unwrap();
        inventory
            .add_item_definition(&POTION.into(), 1, Some(&mut slots))
            .unwrap();

        assert_eq!(slots.assigned, vec![(0, first)]);
        assert_eq!(slots.active, Some(0));
        assert_eq!(inventory.all_items_of_type(ItemType::Weapon).len(), 2);
        assert_eq!(sword().stack_limit, 1);
    }

    #[test]
    fn unknown_items_and_replicas_are_rejected() {
        let (mut inventory, log) = manager();
        assert_eq!(
            inventory.add_item_definition(&"ghost".into(), 1, None),
            Err(InventoryError::UnknownItem("ghost".into()))
        );
        assert!(!inventory.can_add_item_definition(&"ghost".into()));
        assert!(inventory.can_add_item_definition(&POTION.into()));

        let mut replica = InventoryManager::new(
            EntityId(2),
            NetRole::Replica,
            Arc::new(StaticCatalog::standard()),
            log.clone(),
        );
        assert!(matches!(
            replica.add_item_definition(&POTION.into(), 1, None),
            Err(InventoryError::Authority(_))
        ));
        assert!(replica.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn fragments_initialize_new_instances() {
        let (mut inventory, _) = manager();
        let id = inventory
            .add_item_definition(&SWORD.into(), 1, None)
            .unwrap()
            .unwrap();
        let sword = inventory.instance(id).unwrap();
        assert_eq!(sword.stat_count(&crate::testing::SHARPNESS), 3);
    }

    #[test]
    fn instance_transfer_between_inventories() {
        let (mut source, _) = manager();
        let (mut target, log) = manager();
        let id = source
            .add_item_definition(&POTION.into(), 2, None)
            .unwrap()
            .unwrap();

        let instance = source.remove_item_instance(id).unwrap();
        assert!(source.is_empty());
        target.add_item_instance(instance).unwrap();
        target.add_item_definition(&POTION.into(), 1, None).unwrap();

        assert_eq!(counts(&target), vec![3]);
        assert_eq!(stack_changes(&log), vec![(2, 2), (3, 1)]);
        assert_eq!(
            source.remove_item_instance(id),
            Err(InventoryError::UnknownInstance(id))
        );
    }

    #[test]
    fn instance_outside_stack_bounds_is_rejected() {
        let (mut inventory, log) = manager();
        let def = potion();

        let oversized = inventory.add_item_instance(ItemInstance::new(&def, 10));
        let empty = inventory.add_item_instance(ItemInstance::new(&def, 0));

        assert_eq!(
            oversized,
            Err(InventoryError::InvalidStackCount {
                item: def.id.clone(),
                count: 10,
                stack_limit: 3,
            })
        );
        assert!(matches!(empty, Err(InventoryError::InvalidStackCount { count: 0, .. })));
        assert!(inventory.is_empty());
        assert!(log.is_empty());

        inventory.add_item_instance(ItemInstance::new(&def, 3)).unwrap();
        assert_eq!(counts(&inventory), vec![3]);
    }

    #[test]
    fn totals_widen_past_u32() {
        let gold = ItemDefinition::new("gold", "Gold", ItemType::Material, 4_000_000_000);
        let mut inventory = InventoryManager::new(
            EntityId(1),
            NetRole::Authority,
            Arc::new(StaticCatalog::default().with(gold.clone())),
            Arc::new(MessageLog::new()),
        );

        inventory.add_item_definition(&gold.id, 3_000_000_000, None).unwrap();
        inventory.add_item_definition(&gold.id, 3_000_000_000, None).unwrap();

        assert_eq!(inventory.total_item_count(&gold.id), 6_000_000_000);
        assert_eq!(counts(&inventory), vec![4_000_000_000, 2_000_000_000]);

        inventory.remove_item_definition(&gold.id, 4_000_000_000).unwrap();
        assert_eq!(inventory.total_item_count(&gold.id), 2_000_000_000);
    }

    #[test]
    fn pending_changes_stay_bounded_without_drain() {
        let (mut inventory, _) = manager();
        let potion_id = ItemDefId::from(POTION);

        for _ in 0..10_000 {
            inventory.add_item_definition(&potion_id, 1, None).unwrap();
            inventory.remove_item_definition(&potion_id, 1).unwrap();
        }
        assert!(inventory.is_empty());
        assert_eq!(inventory.list().pending_len(), 0);

        inventory.add_item_definition(&potion_id, 1, None).unwrap();
        let id = inventory.take_changes()[0].instance();
        for _ in 0..1_000 {
            inventory.add_item_definition(&potion_id, 2, None).unwrap();
            inventory.remove_item_definition(&potion_id, 1).unwrap();
            inventory.remove_item_definition(&potion_id, 1).unwrap();
        }
        inventory.add_item_definition(&potion_id, 1, None).unwrap();

        assert_eq!(
            inventory.take_changes(),
            vec![InventoryDelta::Changed {
                instance: id,
                old_count: 1,
                new_count: 2,
            }]
        );
    }

    #[test]
    fn pending_changes_match_snapshot_diff() {
        let (mut inventory, _) = manager();
        let potion_id = ItemDefId::from(POTION);
        inventory.add_item_definition(&potion_id, 4, None).unwrap();
        inventory.take_changes();
        let before = inventory.list().snapshot();

        inventory.remove_item_definition(&potion_id, 4).unwrap();
        inventory.add_item_definition(&SWORD.into(), 1, None).unwrap();

        let recorded = inventory.take_changes();
        let diffed = diff_collection(&before, &inventory.list().snapshot());
        assert_eq!(recorded.len(), 3);
        assert_eq!(diffed.len(), 3);
        for change in &diffed {
            assert!(recorded.contains(change), "{change:?}");
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        saves: Mutex<Vec<usize>>,
    }

    impl PersistenceHooks for RecordingHooks {
        fn load_inventory(&self, owner: EntityId) -> Option<InventorySaveData> {
            Some(InventorySaveData {
                owner,
                stacks: vec![crate::inventory::SavedStack {
                    item: POTION.into(),
                    count: 2,
                    stats: Vec::new(),
                }],
            })
        }

        fn save_inventory(&self, _owner: EntityId, data: &InventorySaveData) {
            self.saves.lock().unwrap().push(data.stacks.len());
        }
    }

    #[test]
    fn persistence_hooks_run_after_init_and_mutations() {
        let hooks = Arc::new(RecordingHooks::default());
        let (inventory, _) = manager();
        let mut inventory = inventory.with_persistence(hooks.clone());

        assert_eq!(inventory.initialize(), 1);
        inventory.add_item_definition(&SWORD.into(), 1, None).unwrap();
        let _ = inventory.remove_item_definition(&SWORD.into(), 5);
        inventory.remove_item_definition(&POTION.into(), 2).unwrap();

        assert_eq!(*hooks.saves.lock().unwrap(), vec![2, 1]);
    }
}
