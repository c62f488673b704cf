use std::fmt;

use super::combat::CombatField;
use super::effect::ActiveEffectHandle;
use super::resource::{ResourceField, ResourceKind};

/// Address of one numeric attribute owned by a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    Resource(ResourceKind, ResourceField),
    Combat(CombatField),
}

impl Attribute {
    pub const HEALTH: Self = Self::Resource(ResourceKind::Health, ResourceField::Current);
    pub const MAX_HEALTH: Self = Self::Resource(ResourceKind::Health, ResourceField::Max);
    pub const DAMAGE: Self = Self::Resource(ResourceKind::Health, ResourceField::IncomingDamage);
    pub const HEALING: Self = Self::Resource(ResourceKind::Health, ResourceField::IncomingHealing);
    pub const MANA: Self = Self::Resource(ResourceKind::Mana, ResourceField::Current);
    pub const MAX_MANA: Self = Self::Resource(ResourceKind::Mana, ResourceField::Max);
    pub const DAMAGE_MANA: Self = Self::Resource(ResourceKind::Mana, ResourceField::IncomingDamage);
    pub const HEALING_MANA: Self =
        Self::Resource(ResourceKind::Mana, ResourceField::IncomingHealing);

    pub const fn current(kind: ResourceKind) -> Self {
        Self::Resource(kind, ResourceField::Current)
    }

    pub const fn max(kind: ResourceKind) -> Self {
        Self::Resource(kind, ResourceField::Max)
    }

    /// Meta attributes are transient inputs that post-execute consumes.
    pub const fn is_meta(self) -> bool {
        match self {
            Self::Resource(_, field) => field.is_meta(),
            Self::Combat(_) => false,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(kind, field) => write!(f, "{kind}.{field}"),
            Self::Combat(field) => write!(f, "combat.{field}"),
        }
    }
}

/// How a modifier combines with the value it targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModOp {
    Additive,
    Multiplicative,
    Division,
    Override,
}

impl ModOp {
    /// Applies the operation to `value`. Division by zero leaves `value`
    /// unchanged.
    pub fn apply(self, value: f32, magnitude: f32) -> f32 {
        match self {
            Self::Additive => value + magnitude,
            Self::Multiplicative => value * magnitude,
            Self::Division => {
                if magnitude == 0.0 {
                    tracing::warn!(value, "ignoring division modifier with zero magnitude");
                    value
                } else {
                    value / magnitude
                }
            }
            Self::Override => magnitude,
        }
    }
}

/// One operation on one attribute.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub attribute: Attribute,
    pub op: ModOp,
    pub magnitude: f32,
}

impl Modifier {
    pub const fn new(attribute: Attribute, op: ModOp, magnitude: f32) -> Self {
        Self {
            attribute,
            op,
            magnitude,
        }
    }

    pub const fn add(attribute: Attribute, magnitude: f32) -> Self {
        Self::new(attribute, ModOp::Additive, magnitude)
    }

    pub const fn set(attribute: Attribute, magnitude: f32) -> Self {
        Self::new(attribute, ModOp::Override, magnitude)
    }
}

/// Modifiers held by infinite effects against one attribute.
///
/// Evaluation: `(base + Σadd) × Πmul / Πdiv`, unless an override is active,
/// in which case the most recently added override wins.
#[derive(Clone, Debug, Default)]
pub(crate) struct Aggregator {
    mods: Vec<(ActiveEffectHandle, ModOp, f32)>,
}

impl Aggregator {
    pub(crate) fn push(&mut self, handle: ActiveEffectHandle, op: ModOp, magnitude: f32) {
        self.mods.push((handle, op, magnitude));
    }

    /// Drops every modifier contributed by `handle`.
    pub(crate) fn remove(&mut self, handle: ActiveEffectHandle) -> bool {
        let before = self.mods.len();
        self.mods.retain(|(owner, _, _)| *owner != handle);
        before != self.mods.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub(crate) fn evaluate(&self, base: f32) -> f32 {
        let mut additive = 0.0;
        let mut multiplier = 1.0;
        let mut divisor = 1.0;
        let mut override_value = None;

        for &(_, op, magnitude) in &self.mods {
            match op {
                ModOp::Additive => additive += magnitude,
                ModOp::Multiplicative => multiplier *= magnitude,
                ModOp::Division => {
                    if magnitude == 0.0 {
                        tracing::warn!("ignoring division modifier with zero magnitude");
                    } else {
                        divisor *= magnitude;
                    }
                }
                ModOp::Override => override_value = Some(magnitude),
            }
        }

        override_value.unwrap_or((base + additive) * multiplier / divisor)
    }
}
