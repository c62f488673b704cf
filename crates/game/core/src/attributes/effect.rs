//! Effect specs, executions, and application outcomes.

use super::combat::{CombatField, CombatSet};
use super::event::AttributeEvent;
use super::modifier::{Attribute, Modifier};
use super::resource::{ResourceField, ResourceKind};
use crate::ids::EntityId;
use crate::tags::{self, GameplayTag, TagSet};

/// Who caused an effect and with which tags.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectContext {
    /// Entity that owns the ability or action that produced the effect.
    pub instigator: Option<EntityId>,
    /// Physical causer (a projectile owner, a weapon wielder).
    pub causer: Option<EntityId>,
    /// Tags captured from the source when the spec was created.
    pub source_tags: TagSet,
    /// Tags attached to this particular application.
    pub dynamic_tags: TagSet,
}

impl EffectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instigator(instigator: EntityId) -> Self {
        Self {
            instigator: Some(instigator),
            causer: Some(instigator),
            ..Self::default()
        }
    }

    pub fn with_causer(mut self, causer: EntityId) -> Self {
        self.causer = Some(causer);
        self
    }

    pub fn with_source_tags(mut self, tags: TagSet) -> Self {
        self.source_tags = tags;
        self
    }

    pub fn with_dynamic_tag(mut self, tag: GameplayTag) -> Self {
        self.dynamic_tags.insert(tag);
        self
    }

    /// Self-destruct damage bypasses immunity and cheat floors.
    pub fn is_self_destruct(&self) -> bool {
        self.dynamic_tags.has_matching(&tags::DAMAGE_SELF_DESTRUCT)
    }

    /// Entity reported as the instigator of verb messages.
    pub fn reported_instigator(&self) -> Option<EntityId> {
        self.causer.or(self.instigator)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectDuration {
    /// Modifiers bake into base values once.
    #[default]
    Instant,
    /// Modifiers stay active until the effect is removed by handle.
    Infinite,
}

/// Calculations that turn a captured source magnitude into a modifier on
/// the target's meta attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
    Damage,
    DamageMana,
    Heal,
    HealMana,
}

impl Execution {
    pub const fn damage(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Health => Self::Damage,
            ResourceKind::Mana => Self::DamageMana,
        }
    }

    pub const fn heal(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Health => Self::Heal,
            ResourceKind::Mana => Self::HealMana,
        }
    }

    pub const fn captured_field(self) -> CombatField {
        match self {
            Self::Damage => CombatField::BaseDamage,
            Self::DamageMana => CombatField::BaseDamageMana,
            Self::Heal => CombatField::BaseHeal,
            Self::HealMana => CombatField::BaseHealMana,
        }
    }

    pub const fn target(self) -> Attribute {
        match self {
            Self::Damage => Attribute::DAMAGE,
            Self::DamageMana => Attribute::DAMAGE_MANA,
            Self::Heal => Attribute::HEALING,
            Self::HealMana => Attribute::HEALING_MANA,
        }
    }

    /// Additive modifier on the meta attribute, or `None` when the captured
    /// magnitude is not positive.
    pub fn output(self, source: &CombatSet) -> Option<Modifier> {
        let magnitude = source.get(self.captured_field()).max(0.0);
        (magnitude > 0.0).then(|| Modifier::add(self.target(), magnitude))
    }
}

/// A fully described effect ready to be applied to a ledger.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub context: EffectContext,
    pub duration: EffectDuration,
    pub modifiers: Vec<Modifier>,
    pub executions: Vec<Execution>,
    /// Source combat attributes captured when the spec was built.
    pub captured_source: CombatSet,
}

impl EffectSpec {
    pub fn instant(context: EffectContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    pub fn infinite(context: EffectContext) -> Self {
        Self {
            context,
            duration: EffectDuration::Infinite,
            ..Self::default()
        }
    }

    /// Instant damage of `magnitude` routed through the damage execution.
    pub fn damage(kind: ResourceKind, magnitude: f32, context: EffectContext) -> Self {
        let execution = Execution::damage(kind);
        Self::instant(context)
            .with_execution(execution)
            .capturing(CombatSet::new().with(execution.captured_field(), magnitude))
    }

    /// Instant healing of `magnitude` routed through the heal execution.
    pub fn heal(kind: ResourceKind, magnitude: f32, context: EffectContext) -> Self {
        let execution = Execution::heal(kind);
        Self::instant(context)
            .with_execution(execution)
            .capturing(CombatSet::new().with(execution.captured_field(), magnitude))
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.executions.push(execution);
        self
    }

    pub fn capturing(mut self, source: CombatSet) -> Self {
        self.captured_source = source;
        self
    }

    /// Static modifiers first, then execution outputs in declaration order.
    pub fn resolved_modifiers(&self) -> Vec<Modifier> {
        self.modifiers
            .iter()
            .copied()
            .chain(
                self.executions
                    .iter()
                    .filter_map(|execution| execution.output(&self.captured_source)),
            )
            .collect()
    }
}

/// Handle to an infinite effect held by a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffectHandle(pub u64);

/// Result of running one modifier through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedModifier {
    pub modifier: Modifier,
    /// Pre-execute zeroed the modifier (immunity or god mode).
    pub rejected: bool,
    /// Change in the observable value: `current` for current/meta targets,
    /// `max` for max targets, the field itself for combat targets.
    pub applied_delta: f32,
}

/// Everything one `apply_effect` call did, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectOutcome {
    pub handle: Option<ActiveEffectHandle>,
    pub executed: Vec<ExecutedModifier>,
    pub events: Vec<AttributeEvent>,
}

impl EffectOutcome {
    pub fn is_rejected(&self) -> bool {
        self.executed.iter().any(|executed| executed.rejected)
    }

    /// Net change of `kind`'s current value across all executed modifiers.
    pub fn applied_delta(&self, kind: ResourceKind) -> f32 {
        self.events
            .iter()
            .filter_map(|event| match event {
                AttributeEvent::Changed(change) if change.kind == kind => Some(change.magnitude),
                _ => None,
            })
            .sum()
    }

    pub fn depleted(&self, kind: ResourceKind) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, AttributeEvent::Depleted(change) if change.kind == kind))
    }

    pub fn targets(&self, kind: ResourceKind, field: ResourceField) -> bool {
        self.executed
            .iter()
            .any(|executed| executed.modifier.attribute == Attribute::Resource(kind, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executions_skip_non_positive_captures() {
        let source = CombatSet::new()
            .with(CombatField::BaseDamage, 25.0)
            .with(CombatField::BaseHeal, -4.0);

        assert_eq!(
            Execution::Damage.output(&source),
            Some(Modifier::add(Attribute::DAMAGE, 25.0))
        );
        assert_eq!(Execution::Heal.output(&source), None);
        assert_eq!(Execution::HealMana.output(&source), None);
    }

    #[test]
    fn resolved_modifiers_keep_declaration_order() {
        let spec = EffectSpec::damage(ResourceKind::Mana, 12.0, EffectContext::new())
            .with_modifier(Modifier::add(Attribute::MAX_MANA, 5.0));

        assert_eq!(
            spec.resolved_modifiers(),
            vec![
                Modifier::add(Attribute::MAX_MANA, 5.0),
                Modifier::add(Attribute::DAMAGE_MANA, 12.0),
            ]
        );
    }

    #[test]
    fn self_destruct_is_detected_from_dynamic_tags() {
        let context =
            EffectContext::from_instigator(EntityId(4)).with_dynamic_tag(tags::DAMAGE_SELF_DESTRUCT);
        assert!(context.is_self_destruct());
        assert!(!EffectContext::new().is_self_destruct());
    }
}
