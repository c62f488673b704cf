use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::combat::CombatSet;
use super::effect::{
    ActiveEffectHandle, EffectContext, EffectDuration, EffectOutcome, EffectSpec, ExecutedModifier,
};
use super::error::LedgerError;
use super::event::{AttributeChange, AttributeEvent};
use super::modifier::{Aggregator, Attribute, ModOp, Modifier};
use super::resource::{AttributeData, ResourceField, ResourceKind, ResourceSet, clamp_current};
use crate::authority::{NetRole, ensure_authority};
use crate::config::LedgerConfig;
use crate::events::{Delegate, EventSink, GameMessage, VerbMessage};
use crate::ids::EntityId;
use crate::tags::{self, GameplayTag, TagStackContainer};

/// Health, mana, and combat attributes of one entity.
///
/// All mutators check authority first and return `Err` without side effects
/// when rejected. Successful calls broadcast their [`AttributeEvent`]s on
/// [`Self::on_attribute_event`] in the order the values changed, and return
/// them to the caller as well.
pub struct ResourceLedger {
    owner: EntityId,
    role: NetRole,
    cheats_enabled: bool,
    health: ResourceSet,
    mana: ResourceSet,
    combat: CombatSet,
    tags: TagStackContainer,
    aggregators: BTreeMap<Attribute, Aggregator>,
    active_effects: BTreeMap<ActiveEffectHandle, BTreeSet<Attribute>>,
    next_handle: u64,
    sink: Arc<dyn EventSink>,
    on_attribute_event: Delegate<AttributeEvent>,
}

impl ResourceLedger {
    pub fn new(
        owner: EntityId,
        role: NetRole,
        config: &LedgerConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            owner,
            role,
            cheats_enabled: config.cheats_enabled,
            health: ResourceSet::from_config(ResourceKind::Health, config),
            mana: ResourceSet::from_config(ResourceKind::Mana, config),
            combat: CombatSet::new(),
            tags: TagStackContainer::new(),
            aggregators: BTreeMap::new(),
            active_effects: BTreeMap::new(),
            next_handle: 1,
            sink,
            on_attribute_event: Delegate::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn set(&self, kind: ResourceKind) -> &ResourceSet {
        match kind {
            ResourceKind::Health => &self.health,
            ResourceKind::Mana => &self.mana,
        }
    }

    fn set_mut(&mut self, kind: ResourceKind) -> &mut ResourceSet {
        match kind {
            ResourceKind::Health => &mut self.health,
            ResourceKind::Mana => &mut self.mana,
        }
    }

    pub fn current(&self, kind: ResourceKind) -> f32 {
        self.set(kind).current()
    }

    pub fn max(&self, kind: ResourceKind) -> f32 {
        self.set(kind).max()
    }

    pub fn normalized(&self, kind: ResourceKind) -> f32 {
        self.set(kind).normalized()
    }

    pub fn combat(&self) -> &CombatSet {
        &self.combat
    }

    /// Observable value of any attribute.
    pub fn value(&self, attribute: Attribute) -> f32 {
        match attribute {
            Attribute::Resource(kind, field) => self.set(kind).data(field).current,
            Attribute::Combat(field) => self.combat.get(field),
        }
    }

    /// Pure clamp of a proposed value against the current state.
    pub fn clamp_attribute(&self, attribute: Attribute, proposed: f32) -> f32 {
        match attribute {
            Attribute::Resource(kind, field) => self.set(kind).clamp(field, proposed),
            Attribute::Combat(_) => proposed,
        }
    }

    pub fn tags(&self) -> &TagStackContainer {
        &self.tags
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TagStackContainer {
        &mut self.tags
    }

    /// Local marker bookkeeping (immunity, cheats). Markers are not
    /// replicated, so no authority is required.
    pub fn set_loose_tag_count(&mut self, tag: GameplayTag, count: i32) {
        tracing::debug!(owner = %self.owner, %tag, count, "loose tag count set");
        self.tags.set_count(tag, count);
    }

    pub fn cheats_enabled(&self) -> bool {
        self.cheats_enabled
    }

    pub fn active_effect_count(&self) -> usize {
        self.active_effects.len()
    }

    pub fn on_attribute_event(&mut self) -> &mut Delegate<AttributeEvent> {
        &mut self.on_attribute_event
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Applies an effect spec.
    ///
    /// Instant specs run each resolved modifier through the execute
    /// pipeline. Infinite specs register their modifiers with the
    /// per-attribute aggregators and return a handle for removal.
    pub fn apply_effect(&mut self, spec: &EffectSpec) -> Result<EffectOutcome, LedgerError> {
        ensure_authority(self.role, self.owner, "apply_effect")?;

        let mut outcome = EffectOutcome::default();
        match spec.duration {
            EffectDuration::Instant => {
                for modifier in spec.resolved_modifiers() {
                    let executed = self.execute(modifier, Some(&spec.context), &mut outcome.events);
                    outcome.executed.push(executed);
                }
            }
            EffectDuration::Infinite => {
                if !spec.executions.is_empty() {
                    return Err(LedgerError::ExecutionInInfiniteEffect);
                }
                if let Some(modifier) = spec.modifiers.iter().find(|m| m.attribute.is_meta()) {
                    return Err(LedgerError::NotPersistent {
                        attribute: modifier.attribute,
                    });
                }

                let handle = ActiveEffectHandle(self.next_handle);
                self.next_handle += 1;

                let mut touched = BTreeSet::new();
                for &modifier in &spec.modifiers {
                    self.aggregators
                        .entry(modifier.attribute)
                        .or_default()
                        .push(handle, modifier.op, modifier.magnitude);
                    touched.insert(modifier.attribute);
                    let applied_delta = self.reevaluate(
                        modifier.attribute,
                        Some(&spec.context),
                        &mut outcome.events,
                    );
                    outcome.executed.push(ExecutedModifier {
                        modifier,
                        rejected: false,
                        applied_delta,
                    });
                }
                self.active_effects.insert(handle, touched);
                outcome.handle = Some(handle);
            }
        }

        tracing::debug!(
            owner = %self.owner,
            modifiers = outcome.executed.len(),
            events = outcome.events.len(),
            rejected = outcome.is_rejected(),
            "effect applied"
        );
        self.broadcast(&outcome.events);
        Ok(outcome)
    }

    /// Runs a single modifier through the full execute pipeline.
    pub fn apply_mod_to_attribute(
        &mut self,
        attribute: Attribute,
        op: ModOp,
        magnitude: f32,
    ) -> Result<EffectOutcome, LedgerError> {
        ensure_authority(self.role, self.owner, "apply_mod_to_attribute")?;

        let mut outcome = EffectOutcome::default();
        let executed = self.execute(
            Modifier::new(attribute, op, magnitude),
            None,
            &mut outcome.events,
        );
        outcome.executed.push(executed);
        self.broadcast(&outcome.events);
        Ok(outcome)
    }

    /// Overwrites the base value of a persistent attribute. Skips
    /// pre/post-execute.
    pub fn set_base_value(
        &mut self,
        attribute: Attribute,
        value: f32,
    ) -> Result<Vec<AttributeEvent>, LedgerError> {
        ensure_authority(self.role, self.owner, "set_base_value")?;
        if attribute.is_meta() {
            return Err(LedgerError::NotPersistent { attribute });
        }

        match attribute {
            Attribute::Resource(kind, field) => {
                let set = self.set_mut(kind);
                let clamped = set.clamp(field, value);
                set.data_mut(field).base = clamped;
            }
            Attribute::Combat(field) => self.combat.data_mut(field).base = value,
        }

        let mut events = Vec::new();
        self.reevaluate(attribute, None, &mut events);
        self.broadcast(&events);
        Ok(events)
    }

    /// Removes an infinite effect and re-evaluates every attribute it touched.
    pub fn remove_active_effect(
        &mut self,
        handle: ActiveEffectHandle,
    ) -> Result<Vec<AttributeEvent>, LedgerError> {
        ensure_authority(self.role, self.owner, "remove_active_effect")?;
        let touched = self
            .active_effects
            .remove(&handle)
            .ok_or(LedgerError::UnknownEffect(handle))?;

        let mut events = Vec::new();
        for attribute in touched {
            if let Some(aggregator) = self.aggregators.get_mut(&attribute) {
                aggregator.remove(handle);
                if aggregator.is_empty() {
                    self.aggregators.remove(&attribute);
                }
            }
            self.reevaluate(attribute, None, &mut events);
        }

        tracing::debug!(owner = %self.owner, ?handle, "active effect removed");
        self.broadcast(&events);
        Ok(events)
    }

    /// Accepts an authoritative value on a replica.
    ///
    /// Emits changed / max-changed and the edge-triggered depleted event
    /// with no context. A shrinking max is not enforced here; the authority
    /// replicates the corrected current value itself.
    pub fn apply_replicated(
        &mut self,
        attribute: Attribute,
        value: f32,
    ) -> Result<Vec<AttributeEvent>, LedgerError> {
        if self.role.is_authority() {
            tracing::error!(owner = %self.owner, %attribute, "replicated value on authority");
            return Err(LedgerError::ReplicatedOnAuthority { owner: self.owner });
        }
        if attribute.is_meta() {
            return Err(LedgerError::NotReplicated { attribute });
        }

        let mut events = Vec::new();
        match attribute {
            Attribute::Combat(field) => *self.combat.data_mut(field) = AttributeData::new(value),
            Attribute::Resource(kind, field) => {
                let old_current = self.current(kind);
                let old_max = self.max(kind);
                let set = self.set_mut(kind);
                let clamped = set.clamp(field, value);
                *set.data_mut(field) = AttributeData::new(clamped);

                if field == ResourceField::Max {
                    if clamped != old_max {
                        events.push(AttributeEvent::MaxChanged(
                            self.change(kind, old_max, clamped, None),
                        ));
                    }
                } else {
                    self.notify_current_change(kind, old_current, None, &mut events);
                }
            }
        }

        tracing::trace!(owner = %self.owner, %attribute, value, "replicated value applied");
        self.broadcast(&events);
        Ok(events)
    }

    /// Publishes a verb message about this ledger's owner.
    pub fn publish_verb(&self, verb: GameplayTag, magnitude: f32, context: Option<&EffectContext>) {
        let message = VerbMessage {
            verb,
            instigator: context.and_then(EffectContext::reported_instigator),
            instigator_tags: context.map(|c| c.source_tags.clone()).unwrap_or_default(),
            target: self.owner,
            target_tags: self.tags.to_tag_set(),
            magnitude,
        };
        tracing::debug!(owner = %self.owner, verb = %message.verb, magnitude, "verb published");
        let topic = message.verb.clone();
        self.sink.publish(&topic, GameMessage::Verb(message));
    }

    // ========================================================================
    // Execute pipeline
    // ========================================================================

    fn execute(
        &mut self,
        modifier: Modifier,
        context: Option<&EffectContext>,
        events: &mut Vec<AttributeEvent>,
    ) -> ExecutedModifier {
        let Attribute::Resource(kind, field) = modifier.attribute else {
            let old = self.value(modifier.attribute);
            if let Attribute::Combat(field) = modifier.attribute {
                let data = self.combat.data_mut(field);
                data.base = modifier.op.apply(data.base, modifier.magnitude);
            }
            self.refresh(modifier.attribute, events);
            return ExecutedModifier {
                modifier,
                rejected: false,
                applied_delta: self.value(modifier.attribute) - old,
            };
        };

        if !self.pre_execute(kind, field, &modifier, context) {
            return ExecutedModifier {
                modifier,
                rejected: true,
                applied_delta: 0.0,
            };
        }

        let old_current = self.current(kind);
        let old_max = self.max(kind);

        let set = self.set_mut(kind);
        let proposed = modifier.op.apply(set.data(field).base, modifier.magnitude);
        let clamped = set.clamp(field, proposed);
        set.data_mut(field).base = clamped;
        self.refresh(modifier.attribute, events);

        self.post_execute(kind, field, context, events);

        let applied_delta = if field == ResourceField::Max {
            self.max(kind) - old_max
        } else {
            self.notify_current_change(kind, old_current, context, events);
            self.current(kind) - old_current
        };
        ExecutedModifier {
            modifier,
            rejected: false,
            applied_delta,
        }
    }

    /// Returns false when incoming damage must be zeroed: the owner is immune
    /// or in god mode, and the cause is not self-destruct.
    fn pre_execute(
        &self,
        kind: ResourceKind,
        field: ResourceField,
        modifier: &Modifier,
        context: Option<&EffectContext>,
    ) -> bool {
        if field != ResourceField::IncomingDamage {
            return true;
        }
        let base = self.set(kind).data(field).base;
        if modifier.op.apply(base, modifier.magnitude) <= 0.0 {
            return true;
        }
        if context.is_some_and(EffectContext::is_self_destruct) {
            return true;
        }

        let immune = self.tags.has_matching(&kind.immunity_tag());
        let god_mode = self.cheats_enabled && self.tags.has_matching(&tags::CHEAT_GOD_MODE);
        if immune || god_mode {
            tracing::debug!(
                owner = %self.owner,
                %kind,
                magnitude = modifier.magnitude,
                immune,
                god_mode,
                "incoming damage zeroed"
            );
            return false;
        }
        true
    }

    /// Converts meta attributes into a signed delta on `current` and
    /// re-applies the damage floor.
    fn post_execute(
        &mut self,
        kind: ResourceKind,
        field: ResourceField,
        context: Option<&EffectContext>,
        events: &mut Vec<AttributeEvent>,
    ) {
        let floor = self.damage_floor(kind, context);
        match field {
            ResourceField::IncomingDamage => {
                let damage = self.consume_meta(kind, field);
                if damage > 0.0 {
                    self.publish_verb(kind.damage_verb(), damage, context);
                }
                let target = self.current(kind) - damage;
                self.write_current(kind, target, floor, events);
            }
            ResourceField::IncomingHealing => {
                let healing = self.consume_meta(kind, field);
                let target = self.current(kind) + healing;
                self.write_current(kind, target, floor, events);
            }
            ResourceField::Current => {
                let target = self.current(kind);
                self.write_current(kind, target, floor, events);
            }
            ResourceField::Max => {}
        }
    }

    /// 1 while an unlimited or god-mode cheat is honored, else 0.
    fn damage_floor(&self, kind: ResourceKind, context: Option<&EffectContext>) -> f32 {
        let self_destruct = context.is_some_and(EffectContext::is_self_destruct);
        let cheating = self.tags.has_matching(&tags::CHEAT_GOD_MODE)
            || self.tags.has_matching(&kind.unlimited_tag());
        if self.cheats_enabled && cheating && !self_destruct {
            1.0
        } else {
            0.0
        }
    }

    fn consume_meta(&mut self, kind: ResourceKind, field: ResourceField) -> f32 {
        let data = self.set_mut(kind).data_mut(field);
        let value = data.current;
        *data = AttributeData::default();
        value
    }

    fn write_current(
        &mut self,
        kind: ResourceKind,
        value: f32,
        floor: f32,
        events: &mut Vec<AttributeEvent>,
    ) {
        let set = self.set_mut(kind);
        let target = clamp_current(value, floor, set.max());
        let delta = target - set.current();
        if delta != 0.0 {
            set.data_mut(ResourceField::Current).base += delta;
            self.refresh(Attribute::current(kind), events);
        }
    }

    /// Recomputes the observed value from base and active modifiers, clamps
    /// it, and runs max-change handling.
    fn refresh(&mut self, attribute: Attribute, events: &mut Vec<AttributeEvent>) {
        match attribute {
            Attribute::Combat(field) => {
                let evaluated = self.evaluate(attribute, self.combat.data(field).base);
                self.combat.data_mut(field).current = evaluated;
            }
            Attribute::Resource(kind, field) => {
                let data = self.set(kind).data(field);
                let evaluated = self.evaluate(attribute, data.base);
                let clamped = self.set(kind).clamp(field, evaluated);
                self.set_mut(kind).data_mut(field).current = clamped;

                if field == ResourceField::Max && clamped != data.current {
                    self.post_max_change(kind, data.current, clamped, events);
                }
            }
        }
    }

    fn evaluate(&self, attribute: Attribute, base: f32) -> f32 {
        self.aggregators
            .get(&attribute)
            .map_or(base, |aggregator| aggregator.evaluate(base))
    }

    /// Emits max-changed and forces `current` down through the pipeline when
    /// it exceeds the new max.
    fn post_max_change(
        &mut self,
        kind: ResourceKind,
        old_max: f32,
        new_max: f32,
        events: &mut Vec<AttributeEvent>,
    ) {
        events.push(AttributeEvent::MaxChanged(
            self.change(kind, old_max, new_max, None),
        ));
        if self.current(kind) > new_max {
            tracing::debug!(owner = %self.owner, %kind, new_max, "current overridden to new max");
            self.execute(Modifier::set(Attribute::current(kind), new_max), None, events);
        }
    }

    /// Re-evaluates after aggregator or base changes; returns the change in
    /// the observable value.
    fn reevaluate(
        &mut self,
        attribute: Attribute,
        context: Option<&EffectContext>,
        events: &mut Vec<AttributeEvent>,
    ) -> f32 {
        let old = self.value(attribute);
        match attribute {
            Attribute::Resource(kind, field) if field != ResourceField::Max => {
                self.refresh(attribute, events);
                self.notify_current_change(kind, old, context, events);
            }
            _ => self.refresh(attribute, events),
        }
        self.value(attribute) - old
    }

    fn notify_current_change(
        &mut self,
        kind: ResourceKind,
        old: f32,
        context: Option<&EffectContext>,
        events: &mut Vec<AttributeEvent>,
    ) {
        let new = self.current(kind);
        if new != old {
            events.push(AttributeEvent::Changed(self.change(kind, old, new, context)));
        }
        if self.set_mut(kind).observe_depletion() {
            tracing::debug!(owner = %self.owner, %kind, "resource depleted");
            events.push(AttributeEvent::Depleted(self.change(kind, old, new, context)));
        }
    }

    fn change(
        &self,
        kind: ResourceKind,
        old_value: f32,
        new_value: f32,
        context: Option<&EffectContext>,
    ) -> AttributeChange {
        AttributeChange {
            owner: self.owner,
            kind,
            magnitude: new_value - old_value,
            old_value,
            new_value,
            context: context.cloned(),
        }
    }

    fn broadcast(&mut self, events: &[AttributeEvent]) {
        for event in events {
            self.on_attribute_event.broadcast(event);
        }
    }
}

impl fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLedger")
            .field("owner", &self.owner)
            .field("role", &self.role)
            .field("health", &self.health)
            .field("mana", &self.mana)
            .field("combat", &self.combat)
            .field("tags", &self.tags)
            .field("active_effects", &self.active_effects.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::events::MessageLog;

    fn ledger_with_log(role: NetRole) -> (ResourceLedger, Arc<MessageLog>) {
        let log = Arc::new(MessageLog::new());
        let ledger = ResourceLedger::new(EntityId(7), role, &LedgerConfig::default(), log.clone());
        (ledger, log)
    }

    fn hit(magnitude: f32) -> EffectSpec {
        EffectSpec::damage(
            ResourceKind::Health,
            magnitude,
            EffectContext::from_instigator(EntityId(1)),
        )
    }

    fn count(events: &[AttributeEvent], pred: fn(&AttributeEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    fn is_changed(event: &AttributeEvent) -> bool {
        matches!(event, AttributeEvent::Changed(_))
    }

    fn is_depleted(event: &AttributeEvent) -> bool {
        matches!(event, AttributeEvent::Depleted(_))
    }

    #[test]
    fn damage_reduces_current_and_emits_one_change() {
        let (mut ledger, log) = ledger_with_log(NetRole::Authority);

        let outcome = ledger.apply_effect(&hit(30.0)).unwrap();

        assert_eq!(ledger.current(ResourceKind::Health), 70.0);
        assert_eq!(count(&outcome.events, is_changed), 1);
        assert_eq!(count(&outcome.events, is_depleted), 0);
        let change = outcome.events[0].change();
        assert_eq!((change.old_value, change.new_value), (100.0, 70.0));
        assert_eq!(outcome.applied_delta(ResourceKind::Health), -30.0);

        let verbs = log.on_topic(&tags::MESSAGE_DAMAGE);
        assert_eq!(verbs.len(), 1);
        let GameMessage::Verb(verb) = &verbs[0] else {
            panic!("expected verb message");
        };
        assert_eq!(verb.magnitude, 30.0);
        assert_eq!(verb.instigator, Some(EntityId(1)));
        assert_eq!(verb.target, EntityId(7));
    }

    #[test]
    fn overkill_clamps_to_zero_and_depletes_once() {
        let (mut ledger, log) = ledger_with_log(NetRole::Authority);

        let outcome = ledger.apply_effect(&hit(150.0)).unwrap();
        assert_eq!(ledger.current(ResourceKind::Health), 0.0);
        assert_eq!(count(&outcome.events, is_changed), 1);
        assert_eq!(count(&outcome.events, is_depleted), 1);
        assert!(outcome.depleted(ResourceKind::Health));

        // Already at zero: the verb still fires, nothing else does.
        let outcome = ledger.apply_effect(&hit(10.0)).unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(log.on_topic(&tags::MESSAGE_DAMAGE).len(), 2);

        let heal = EffectSpec::heal(ResourceKind::Health, 5.0, EffectContext::new());
        let outcome = ledger.apply_effect(&heal).unwrap();
        assert_eq!(count(&outcome.events, is_depleted), 0);
        assert_eq!(ledger.current(ResourceKind::Health), 5.0);

        let outcome = ledger.apply_effect(&hit(20.0)).unwrap();
        assert_eq!(count(&outcome.events, is_depleted), 1);
    }

    #[test]
    fn current_stays_within_bounds_for_any_write_sequence() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);
        let writes = [
            (ModOp::Additive, 250.0),
            (ModOp::Additive, -400.0),
            (ModOp::Multiplicative, -3.0),
            (ModOp::Override, 42.0),
            (ModOp::Division, 0.0),
            (ModOp::Override, f32::NAN),
            (ModOp::Multiplicative, 10.0),
        ];

        for (op, magnitude) in writes {
            ledger
                .apply_mod_to_attribute(Attribute::MANA, op, magnitude)
                .unwrap();
            let mana = ledger.current(ResourceKind::Mana);
            assert!((0.0..=ledger.max(ResourceKind::Mana)).contains(&mana), "{mana}");
        }
    }

    #[test]
    fn max_never_drops_below_one_and_drags_current_down() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);

        let events = ledger.set_base_value(Attribute::MAX_HEALTH, -20.0).unwrap();

        assert_eq!(ledger.max(ResourceKind::Health), 1.0);
        assert_eq!(ledger.current(ResourceKind::Health), 1.0);
        assert!(matches!(events[0], AttributeEvent::MaxChanged(_)));
        assert!(matches!(events[1], AttributeEvent::Changed(ref c) if c.new_value == 1.0));

        ledger
            .apply_mod_to_attribute(Attribute::MAX_HEALTH, ModOp::Multiplicative, 0.0)
            .unwrap();
        assert_eq!(ledger.max(ResourceKind::Health), 1.0);
    }

    #[test]
    fn immunity_rejects_damage_without_side_effects() {
        let (mut ledger, log) = ledger_with_log(NetRole::Authority);
        ledger.set_loose_tag_count(tags::DAMAGE_IMMUNITY_HEALTH, 1);

        let outcome = ledger.apply_effect(&hit(40.0)).unwrap();
        assert!(outcome.is_rejected());
        assert!(outcome.events.is_empty());
        assert!(log.is_empty());
        assert_eq!(ledger.current(ResourceKind::Health), 100.0);

        // Mana damage is unaffected by health immunity.
        let drain = EffectSpec::damage(ResourceKind::Mana, 40.0, EffectContext::new());
        ledger.apply_effect(&drain).unwrap();
        assert_eq!(ledger.current(ResourceKind::Mana), 60.0);

        let self_destruct = EffectSpec::damage(
            ResourceKind::Health,
            100.0,
            EffectContext::new().with_dynamic_tag(tags::DAMAGE_SELF_DESTRUCT),
        );
        let outcome = ledger.apply_effect(&self_destruct).unwrap();
        assert!(!outcome.is_rejected());
        assert_eq!(ledger.current(ResourceKind::Health), 0.0);
    }

    #[test]
    fn cheats_floor_damage_at_one_only_when_enabled() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);
        ledger.set_loose_tag_count(tags::CHEAT_UNLIMITED_HEALTH, 1);
        ledger.apply_effect(&hit(500.0)).unwrap();
        assert_eq!(ledger.current(ResourceKind::Health), 1.0);

        ledger.set_loose_tag_count(tags::CHEAT_GOD_MODE, 1);
        let outcome = ledger.apply_effect(&hit(500.0)).unwrap();
        assert!(outcome.is_rejected());

        let config = LedgerConfig {
            cheats_enabled: false,
            ..LedgerConfig::default()
        };
        let mut strict =
            ResourceLedger::new(EntityId(8), NetRole::Authority, &config, Arc::new(MessageLog::new()));
        strict.set_loose_tag_count(tags::CHEAT_GOD_MODE, 1);
        strict.apply_effect(&hit(500.0)).unwrap();
        assert_eq!(strict.current(ResourceKind::Health), 0.0);
    }

    #[test]
    fn infinite_max_buff_is_removed_and_current_reclamped() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);
        let buff = EffectSpec::infinite(EffectContext::new())
            .with_modifier(Modifier::add(Attribute::MAX_HEALTH, 50.0));

        let outcome = ledger.apply_effect(&buff).unwrap();
        let handle = outcome.handle.unwrap();
        assert_eq!(ledger.max(ResourceKind::Health), 150.0);
        assert_eq!(ledger.current(ResourceKind::Health), 100.0);

        let heal = EffectSpec::heal(ResourceKind::Health, 80.0, EffectContext::new());
        ledger.apply_effect(&heal).unwrap();
        assert_eq!(ledger.current(ResourceKind::Health), 150.0);

        let events = ledger.remove_active_effect(handle).unwrap();
        assert_eq!(ledger.max(ResourceKind::Health), 100.0);
        assert_eq!(ledger.current(ResourceKind::Health), 100.0);
        assert!(matches!(events[0], AttributeEvent::MaxChanged(_)));
        assert!(matches!(events[1], AttributeEvent::Changed(_)));
        assert_eq!(ledger.active_effect_count(), 0);

        assert_eq!(
            ledger.remove_active_effect(handle),
            Err(LedgerError::UnknownEffect(handle))
        );
    }

    #[test]
    fn infinite_effects_reject_meta_attributes() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);
        let spec = EffectSpec::infinite(EffectContext::new())
            .with_modifier(Modifier::add(Attribute::DAMAGE, 5.0));
        assert_eq!(
            ledger.apply_effect(&spec),
            Err(LedgerError::NotPersistent {
                attribute: Attribute::DAMAGE
            })
        );
        assert_eq!(ledger.active_effect_count(), 0);
    }

    #[test]
    fn replica_cannot_mutate_but_mirrors_authoritative_values() {
        let (mut replica, log) = ledger_with_log(NetRole::Replica);

        assert!(matches!(
            replica.apply_effect(&hit(10.0)),
            Err(LedgerError::Authority(_))
        ));
        assert_eq!(replica.current(ResourceKind::Health), 100.0);
        assert!(log.is_empty());

        let events = replica.apply_replicated(Attribute::HEALTH, 0.0).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.change().context.is_none()));
        assert!(is_depleted(&events[1]));

        let events = replica.apply_replicated(Attribute::HEALTH, 0.0).unwrap();
        assert!(events.is_empty());

        assert!(matches!(
            replica.apply_replicated(Attribute::DAMAGE, 3.0),
            Err(LedgerError::NotReplicated { .. })
        ));
    }

    #[test]
    fn subscribers_see_events_in_change_order() {
        let (mut ledger, _) = ledger_with_log(NetRole::Authority);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            ledger.on_attribute_event().subscribe(move |event: &AttributeEvent| {
                let label = match event {
                    AttributeEvent::Changed(_) => "changed",
                    AttributeEvent::MaxChanged(_) => "max",
                    AttributeEvent::Depleted(_) => "depleted",
                };
                seen.lock().unwrap().push(label);
            });
        }

        ledger.apply_effect(&hit(100.0)).unwrap();
        ledger.set_base_value(Attribute::MAX_HEALTH, 40.0).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["changed", "depleted", "max"]);
    }
}
