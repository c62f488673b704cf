//! Session host for spawned entities.
//!
//! A session owns one [`Character`] and one [`QuickBar`] per entity, the
//! shared item catalog, the persistence backend, and two event buses: the
//! authority bus that core components publish into, and the replica bus
//! that mirrored state publishes into when [`Session::sync`] forwards
//! changes. Every call is routed by [`EntityId`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use game_core::{
    Attribute, AttributeEvent, Character, DeathState, DeathTransition, EffectOutcome, EntityId,
    EventSink, GameplayTag, InstanceId, InventoryItemCost, ItemCatalog, ItemDefId, ItemInstance,
    LedgerConfig, NetRole, NoopPersistence, PersistenceHooks, ReplicaInventory, ResourceKind,
    SlotAssignment, TagSet,
};

use crate::error::{Result, RuntimeError};
use crate::events::EventBus;
use crate::quickbar::QuickBar;

/// Runtime configuration shared across every entity in a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfig {
    pub ledger: LedgerConfig,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            event_buffer_size: 100,
        }
    }
}

struct EntityRecord {
    character: Character,
    quick_bar: QuickBar,
    replica: Option<ReplicaMirror>,
}

/// Replica-side view of one entity, fed only through [`Session::sync`].
struct ReplicaMirror {
    character: Character,
    inventory: ReplicaInventory,
}

/// Attributes mirrored on sync. Max goes first so the replica never clamps
/// an incoming current value against a stale max.
const MIRRORED: [Attribute; 4] = [
    Attribute::MAX_HEALTH,
    Attribute::HEALTH,
    Attribute::MAX_MANA,
    Attribute::MANA,
];

pub struct Session {
    config: RuntimeConfig,
    catalog: Arc<dyn ItemCatalog>,
    persistence: Arc<dyn PersistenceHooks>,
    bus: Arc<EventBus>,
    replica_bus: Arc<EventBus>,
    entities: BTreeMap<EntityId, EntityRecord>,
}

impl Session {
    /// Create a new session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn ItemCatalog {
        self.catalog.as_ref()
    }

    /// Bus that authority-side components publish into.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Bus that replica mirrors publish into.
    pub fn replica_bus(&self) -> &EventBus {
        &self.replica_bus
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Spawns an authority-owned entity and restores any saved state.
    pub fn spawn(&mut self, id: EntityId) -> Result<&Character> {
        if self.entities.contains_key(&id) {
            return Err(RuntimeError::DuplicateEntity(id));
        }

        let sink: Arc<dyn EventSink> = self.bus.clone();
        let mut character = Character::new(
            id,
            NetRole::Authority,
            &self.config.ledger,
            Arc::clone(&self.catalog),
            sink,
        )
        .with_persistence(Arc::clone(&self.persistence));
        character.initialize()?;

        tracing::info!(
            entity = %id,
            health = character.ledger().current(ResourceKind::Health),
            mana = character.ledger().current(ResourceKind::Mana),
            stacks = character.inventory().list().len(),
            "entity spawned"
        );

        let record = self.entities.entry(id).or_insert(EntityRecord {
            character,
            quick_bar: QuickBar::from_config(&self.config.ledger),
            replica: None,
        });
        Ok(&record.character)
    }

    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        if self.entities.remove(&id).is_none() {
            return Err(RuntimeError::UnknownEntity(id));
        }
        tracing::info!(entity = %id, "entity despawned");
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn character(&self, id: EntityId) -> Result<&Character> {
        self.record(id).map(|record| &record.character)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Result<&mut Character> {
        self.record_mut(id).map(|record| &mut record.character)
    }

    pub fn quick_bar(&self, id: EntityId) -> Result<&QuickBar> {
        self.record(id).map(|record| &record.quick_bar)
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Adds `count` units of `item`; equippable pickups take a quick-bar slot.
    pub fn give(
        &mut self,
        id: EntityId,
        item: &ItemDefId,
        count: u32,
    ) -> Result<Option<InstanceId>> {
        let record = self.record_mut(id)?;
        let slots: &mut dyn SlotAssignment = &mut record.quick_bar;
        Ok(record.character.give(item, count, Some(slots))?)
    }

    pub fn remove(&mut self, id: EntityId, item: &ItemDefId, count: u32) -> Result<()> {
        let record = self.record_mut(id)?;
        record
            .character
            .inventory_mut()
            .remove_item_definition(item, count)?;
        record.prune_quick_bar();
        Ok(())
    }

    pub fn use_item(&mut self, id: EntityId, item: &ItemDefId) -> Result<EffectOutcome> {
        let record = self.record_mut(id)?;
        let outcome = record.character.use_item(item)?;
        record.prune_quick_bar();
        Ok(outcome)
    }

    /// Pays an ability cost in items. Returns `false` and pays nothing when
    /// the inventory cannot afford it.
    pub fn pay_item_cost(
        &mut self,
        id: EntityId,
        cost: &InventoryItemCost,
        level: u32,
    ) -> Result<bool> {
        let record = self.record_mut(id)?;
        let inventory = record.character.inventory_mut();
        let mut failure_tags = TagSet::new();
        if !cost.check_cost(inventory, level, Some(&mut failure_tags)) {
            tracing::debug!(entity = %id, item = %cost.item, level, ?failure_tags, "item cost not affordable");
            return Ok(false);
        }
        cost.apply_cost(inventory, level)?;
        record.prune_quick_bar();
        Ok(true)
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    pub fn damage(
        &mut self,
        id: EntityId,
        kind: ResourceKind,
        magnitude: f32,
        instigator: Option<EntityId>,
    ) -> Result<EffectOutcome> {
        Ok(self.character_mut(id)?.damage(kind, magnitude, instigator)?)
    }

    pub fn heal(
        &mut self,
        id: EntityId,
        kind: ResourceKind,
        magnitude: f32,
        instigator: Option<EntityId>,
    ) -> Result<EffectOutcome> {
        Ok(self.character_mut(id)?.heal(kind, magnitude, instigator)?)
    }

    pub fn set_max(
        &mut self,
        id: EntityId,
        kind: ResourceKind,
        value: f32,
    ) -> Result<Vec<AttributeEvent>> {
        Ok(self.character_mut(id)?.set_max(kind, value)?)
    }

    pub fn self_destruct(
        &mut self,
        id: EntityId,
        kind: ResourceKind,
        fell_out_of_world: bool,
    ) -> Result<Option<EffectOutcome>> {
        Ok(self
            .character_mut(id)?
            .damage_self_destruct(kind, fell_out_of_world)?)
    }

    pub fn finish_death(&mut self, id: EntityId) -> Result<DeathTransition> {
        Ok(self.character_mut(id)?.finish_death()?)
    }

    /// Sets a loose tag count (immunity, cheat markers) on the entity.
    pub fn set_tag(&mut self, id: EntityId, tag: GameplayTag, count: i32) -> Result<()> {
        tracing::debug!(entity = %id, %tag, count, "loose tag set");
        self.character_mut(id)?
            .ledger_mut()
            .set_loose_tag_count(tag, count);
        Ok(())
    }

    // ========================================================================
    // Replication
    // ========================================================================

    /// Forwards pending inventory changes, resource values, and the death
    /// state of `id` to its replica mirror, creating the mirror on first use.
    pub fn sync(&mut self, id: EntityId) -> Result<SyncReport> {
        let Self {
            config,
            catalog,
            replica_bus,
            entities,
            ..
        } = self;
        let record = entities.get_mut(&id).ok_or(RuntimeError::UnknownEntity(id))?;

        let mirror = record.replica.get_or_insert_with(|| {
            tracing::debug!(entity = %id, "replica mirror created");
            let sink: Arc<dyn EventSink> = replica_bus.clone();
            ReplicaMirror {
                character: Character::new(
                    id,
                    NetRole::Replica,
                    &config.ledger,
                    Arc::clone(catalog),
                    Arc::clone(&sink),
                ),
                inventory: ReplicaInventory::new(id, sink),
            }
        });

        let changes = record.character.inventory_mut().take_changes();
        let messages = mirror.inventory.apply(&changes);

        let mut attributes = 0;
        for attribute in MIRRORED {
            let authoritative = record.character.ledger().value(attribute);
            if mirror.character.ledger().value(attribute) != authoritative {
                mirror.character.apply_replicated(attribute, authoritative)?;
                attributes += 1;
            }
        }

        let transition = mirror
            .character
            .reconcile_death(record.character.death_state());

        let report = SyncReport {
            inventory_changes: changes.len(),
            messages,
            attributes,
            death: mirror.character.death_state(),
            death_advanced: transition.advanced(),
        };
        tracing::debug!(entity = %id, ?report, "replica synced");
        Ok(report)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn snapshot(&self, id: EntityId) -> Result<EntitySnapshot> {
        let record = self.record(id)?;
        Ok(EntitySnapshot::new(
            &record.character,
            record.character.inventory().list().instances(),
            Some(&record.quick_bar),
        ))
    }

    /// Snapshot of the replica mirror, `None` until the first sync.
    pub fn replica_snapshot(&self, id: EntityId) -> Result<Option<EntitySnapshot>> {
        let record = self.record(id)?;
        Ok(record.replica.as_ref().map(|mirror| {
            EntitySnapshot::new(
                &mirror.character,
                mirror.inventory.entries().iter().map(|entry| entry.instance()),
                None,
            )
        }))
    }

    fn record(&self, id: EntityId) -> Result<&EntityRecord> {
        self.entities.get(&id).ok_or(RuntimeError::UnknownEntity(id))
    }

    fn record_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord> {
        self.entities
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownEntity(id))
    }
}

impl EntityRecord {
    /// Frees quick-bar slots whose instance left the inventory.
    fn prune_quick_bar(&mut self) {
        let stale: Vec<InstanceId> = self
            .quick_bar
            .slots()
            .iter()
            .flatten()
            .copied()
            .filter(|instance| self.character.inventory().instance(*instance).is_none())
            .collect();
        for instance in stale {
            if let Some(index) = self.quick_bar.clear_instance(instance) {
                tracing::debug!(entity = %self.character.id(), index, %instance, "quick bar slot freed");
            }
        }
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: RuntimeConfig,
    catalog: Option<Arc<dyn ItemCatalog>>,
    persistence: Option<Arc<dyn PersistenceHooks>>,
    bus: Option<EventBus>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            persistence: None,
            bus: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ledger_config(mut self, ledger: LedgerConfig) -> Self {
        self.config.ledger = ledger;
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn ItemCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn persistence(mut self, persistence: Arc<dyn PersistenceHooks>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Uses an existing bus instead of creating one sized from the config.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<Session> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;
        let capacity = self.config.event_buffer_size;
        let bus = self
            .bus
            .unwrap_or_else(|| EventBus::with_capacity(capacity));

        tracing::debug!(
            items = catalog.all_definitions().len(),
            capacity,
            "session built"
        );

        Ok(Session {
            catalog,
            persistence: self
                .persistence
                .unwrap_or_else(|| Arc::new(NoopPersistence)),
            bus: Arc::new(bus),
            replica_bus: Arc::new(EventBus::with_capacity(capacity)),
            entities: BTreeMap::new(),
            config: self.config,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What one [`Session::sync`] call forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Inventory change records drained from the authority.
    pub inventory_changes: usize,
    /// Stack-changed messages the replica published.
    pub messages: usize,
    /// Attribute values that differed and were replicated.
    pub attributes: usize,
    pub death: DeathState,
    pub death_advanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub current: f32,
    pub max: f32,
    pub normalized: f32,
    pub depleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    pub instance: InstanceId,
    pub item: ItemDefId,
    pub count: u32,
    pub stack_limit: u32,
    pub stats: Vec<(GameplayTag, i32)>,
}

impl From<&ItemInstance> for ItemSnapshot {
    fn from(instance: &ItemInstance) -> Self {
        Self {
            instance: instance.id(),
            item: instance.definition().clone(),
            count: instance.count(),
            stack_limit: instance.stack_limit(),
            stats: instance
                .stats()
                .iter()
                .map(|(tag, count)| (tag.clone(), count))
                .collect(),
        }
    }
}

/// Read-only view of one entity, suitable for display or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub role: NetRole,
    pub health: ResourceSnapshot,
    pub mana: ResourceSnapshot,
    pub death: DeathState,
    pub tags: Vec<(GameplayTag, i32)>,
    pub items: Vec<ItemSnapshot>,
    pub quick_bar: Vec<Option<InstanceId>>,
    pub active_slot: Option<usize>,
}

impl EntitySnapshot {
    fn new<'a>(
        character: &Character,
        items: impl Iterator<Item = &'a ItemInstance>,
        quick_bar: Option<&QuickBar>,
    ) -> Self {
        let ledger = character.ledger();
        let resource = |kind| {
            let set = ledger.set(kind);
            ResourceSnapshot {
                current: set.current(),
                max: set.max(),
                normalized: set.normalized(),
                depleted: set.is_out_of_resource(),
            }
        };
        Self {
            id: character.id(),
            role: ledger.role(),
            health: resource(ResourceKind::Health),
            mana: resource(ResourceKind::Mana),
            death: character.death_state(),
            tags: ledger
                .tags()
                .iter()
                .map(|(tag, count)| (tag.clone(), count))
                .collect(),
            items: items.map(ItemSnapshot::from).collect(),
            quick_bar: quick_bar
                .map(|bar| bar.slots().to_vec())
                .unwrap_or_default(),
            active_slot: quick_bar.and_then(QuickBar::active),
        }
    }

    pub fn total_count(&self, item: &ItemDefId) -> u64 {
        self.items
            .iter()
            .filter(|stack| &stack.item == item)
            .map(|stack| u64::from(stack.count))
            .sum()
    }
}
