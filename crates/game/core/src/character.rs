//! An entity that owns a resource ledger, a death sequence, and an
//! inventory, and wires them together.
//!
//! - a depleted event caused by an effect publishes an "out of <resource>"
//!   verb message
//! - health depletion on the authority starts the death sequence when
//!   [`LedgerConfig::death_on_health_depleted`] is set
//! - consuming an item applies its consume-effects fragment to the owner

use std::sync::Arc;

use crate::attributes::{
    Attribute, AttributeEvent, EffectContext, EffectOutcome, EffectSpec, LedgerError,
    ResourceKind, ResourceLedger,
};
use crate::authority::{AuthorityError, NetRole, ensure_authority};
use crate::config::LedgerConfig;
use crate::death::{DeathEvent, DeathSequence, DeathState, DeathTransition};
use crate::error::{ErrorSeverity, GameError};
use crate::events::{Delegate, EventSink};
use crate::ids::{EntityId, InstanceId, ItemDefId};
use crate::inventory::{InventoryError, InventoryManager, ItemCatalog, SlotAssignment};
use crate::persistence::{LedgerSaveData, NoopPersistence, PersistenceHooks};
use crate::tags;

/// Failure of a call that touches both inventory and ledger.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CharacterError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl GameError for CharacterError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Inventory(err) => err.severity(),
            Self::Ledger(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Inventory(err) => err.error_code(),
            Self::Ledger(err) => err.error_code(),
        }
    }
}

pub struct Character {
    id: EntityId,
    death_on_health_depleted: bool,
    ledger: ResourceLedger,
    death: DeathSequence,
    inventory: InventoryManager,
    persistence: Arc<dyn PersistenceHooks>,
}

impl Character {
    pub fn new(
        id: EntityId,
        role: NetRole,
        config: &LedgerConfig,
        catalog: Arc<dyn ItemCatalog>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id,
            death_on_health_depleted: config.death_on_health_depleted,
            ledger: ResourceLedger::new(id, role, config, Arc::clone(&sink)),
            death: DeathSequence::new(id, role),
            inventory: InventoryManager::new(id, role, catalog, sink),
            persistence: Arc::new(NoopPersistence),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceHooks>) -> Self {
        self.inventory = self.inventory.with_persistence(Arc::clone(&persistence));
        self.persistence = persistence;
        self
    }

    /// Runs the post-initialization load hooks.
    ///
    /// Restored values go through the same event handling as live writes,
    /// so a ledger saved at zero health starts the death sequence.
    pub fn initialize(&mut self) -> Result<(), LedgerError> {
        self.inventory.initialize();
        let Some(saved) = self.persistence.load_ledger(self.id) else {
            return Ok(());
        };
        if !self.ledger.role().is_authority() {
            return Ok(());
        }

        let mut events = Vec::new();
        for (attribute, value) in [
            (Attribute::MAX_HEALTH, saved.max_health),
            (Attribute::HEALTH, saved.health),
            (Attribute::MAX_MANA, saved.max_mana),
            (Attribute::MANA, saved.mana),
        ] {
            events.extend(self.ledger.set_base_value(attribute, value)?);
        }
        self.handle_attribute_events(&events);
        tracing::info!(owner = %self.id, "ledger restored");
        Ok(())
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn death(&self) -> &DeathSequence {
        &self.death
    }

    pub fn death_state(&self) -> DeathState {
        self.death.state()
    }

    pub fn inventory(&self) -> &InventoryManager {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryManager {
        &mut self.inventory
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    pub fn apply_effect(&mut self, spec: &EffectSpec) -> Result<EffectOutcome, LedgerError> {
        let outcome = self.ledger.apply_effect(spec)?;
        self.handle_attribute_events(&outcome.events);
        self.save_ledger();
        Ok(outcome)
    }

    pub fn damage(
        &mut self,
        kind: ResourceKind,
        magnitude: f32,
        instigator: Option<EntityId>,
    ) -> Result<EffectOutcome, LedgerError> {
        let context = instigator.map_or_else(EffectContext::new, EffectContext::from_instigator);
        self.apply_effect(&EffectSpec::damage(kind, magnitude, context))
    }

    pub fn heal(
        &mut self,
        kind: ResourceKind,
        magnitude: f32,
        instigator: Option<EntityId>,
    ) -> Result<EffectOutcome, LedgerError> {
        let context = instigator.map_or_else(EffectContext::new, EffectContext::from_instigator);
        self.apply_effect(&EffectSpec::heal(kind, magnitude, context))
    }

    pub fn set_max(
        &mut self,
        kind: ResourceKind,
        value: f32,
    ) -> Result<Vec<AttributeEvent>, LedgerError> {
        let events = self.ledger.set_base_value(Attribute::max(kind), value)?;
        self.handle_attribute_events(&events);
        self.save_ledger();
        Ok(events)
    }

    /// Damage equal to the resource max that bypasses immunity and cheats.
    /// Does nothing once the death sequence has started.
    pub fn damage_self_destruct(
        &mut self,
        kind: ResourceKind,
        fell_out_of_world: bool,
    ) -> Result<Option<EffectOutcome>, LedgerError> {
        if self.death.state() != DeathState::NotDead {
            tracing::debug!(owner = %self.id, "self-destruct ignored while dying or dead");
            return Ok(None);
        }
        let mut context = EffectContext::from_instigator(self.id)
            .with_dynamic_tag(tags::DAMAGE_SELF_DESTRUCT);
        if fell_out_of_world {
            context = context.with_dynamic_tag(tags::DAMAGE_FELL_OUT_OF_WORLD);
        }
        let magnitude = self.ledger.max(kind);
        tracing::info!(owner = %self.id, %kind, fell_out_of_world, "self-destruct");
        self.apply_effect(&EffectSpec::damage(kind, magnitude, context))
            .map(Some)
    }

    /// Mirrors an authoritative attribute value on a replica.
    pub fn apply_replicated(
        &mut self,
        attribute: Attribute,
        value: f32,
    ) -> Result<Vec<AttributeEvent>, LedgerError> {
        let events = self.ledger.apply_replicated(attribute, value)?;
        self.handle_attribute_events(&events);
        Ok(events)
    }

    // ========================================================================
    // Death
    // ========================================================================

    pub fn start_death(&mut self) -> Result<DeathTransition, AuthorityError> {
        self.death.start_death(self.ledger.tags_mut())
    }

    pub fn finish_death(&mut self) -> Result<DeathTransition, AuthorityError> {
        self.death.finish_death(self.ledger.tags_mut())
    }

    pub fn reconcile_death(&mut self, authoritative: DeathState) -> DeathTransition {
        self.death.reconcile(authoritative, self.ledger.tags_mut())
    }

    pub fn on_death(&mut self) -> &mut Delegate<DeathEvent> {
        self.death.on_death()
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub fn give(
        &mut self,
        item: &ItemDefId,
        count: u32,
        slots: Option<&mut dyn SlotAssignment>,
    ) -> Result<Option<InstanceId>, InventoryError> {
        self.inventory.add_item_definition(item, count, slots)
    }

    /// Consumes one unit of `item` and applies its consume effects to this
    /// character.
    pub fn use_item(&mut self, item: &ItemDefId) -> Result<EffectOutcome, CharacterError> {
        ensure_authority(self.ledger.role(), self.id, "use_item").map_err(InventoryError::from)?;
        let definition = self.inventory.catalog().definition(item).ok_or_else(|| {
            tracing::error!(owner = %self.id, %item, "used item missing from catalog");
            InventoryError::UnknownItem(item.clone())
        })?;

        self.inventory.remove_item_definition(item, 1)?;

        let mut spec = EffectSpec::instant(
            EffectContext::from_instigator(self.id).with_source_tags(self.ledger.tags().to_tag_set()),
        );
        for modifier in definition.consume_modifiers() {
            spec = spec.with_modifier(modifier);
        }
        tracing::debug!(owner = %self.id, %item, modifiers = spec.modifiers.len(), "item used");
        Ok(self.apply_effect(&spec)?)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn handle_attribute_events(&mut self, events: &[AttributeEvent]) {
        for event in events {
            let AttributeEvent::Depleted(change) = event else {
                continue;
            };
            if let Some(context) = &change.context {
                self.ledger.publish_verb(
                    change.kind.depleted_verb(),
                    change.magnitude.abs(),
                    Some(context),
                );
            }
            if change.kind == ResourceKind::Health
                && self.death_on_health_depleted
                && self.ledger.role().is_authority()
            {
                if let Err(err) = self.start_death() {
                    tracing::error!(owner = %self.id, %err, "could not start death");
                }
            }
        }
    }

    fn save_ledger(&self) {
        let data = LedgerSaveData {
            health: self.ledger.current(ResourceKind::Health),
            max_health: self.ledger.max(ResourceKind::Health),
            mana: self.ledger.current(ResourceKind::Mana),
            max_mana: self.ledger.max(ResourceKind::Mana),
        };
        self.persistence.save_ledger(self.id, &data);
    }
}
