use crate::config::LedgerConfig;
use crate::tags::{self, GameplayTag};

/// Paired resources tracked by the ledger.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Health,
    Mana,
}

impl ResourceKind {
    /// Marker that makes the owner ignore incoming damage to this resource.
    pub const fn immunity_tag(self) -> GameplayTag {
        match self {
            Self::Health => tags::DAMAGE_IMMUNITY_HEALTH,
            Self::Mana => tags::DAMAGE_IMMUNITY_MANA,
        }
    }

    /// Cheat marker that keeps this resource from dropping below 1.
    pub const fn unlimited_tag(self) -> GameplayTag {
        match self {
            Self::Health => tags::CHEAT_UNLIMITED_HEALTH,
            Self::Mana => tags::CHEAT_UNLIMITED_MANA,
        }
    }

    /// Verb published whenever positive damage reaches this resource.
    pub const fn damage_verb(self) -> GameplayTag {
        match self {
            Self::Health => tags::MESSAGE_DAMAGE,
            Self::Mana => tags::MESSAGE_DAMAGE_MANA,
        }
    }

    /// Verb published when this resource is depleted by an effect.
    pub const fn depleted_verb(self) -> GameplayTag {
        match self {
            Self::Health => tags::MESSAGE_OUT_OF_HEALTH,
            Self::Mana => tags::MESSAGE_OUT_OF_MANA,
        }
    }
}

/// Members of a paired resource.
///
/// `IncomingDamage` and `IncomingHealing` are transient meta attributes: an
/// execution writes them, post-execute converts them into a signed delta on
/// `Current` and resets them to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceField {
    Current,
    Max,
    IncomingDamage,
    IncomingHealing,
}

impl ResourceField {
    pub const fn is_meta(self) -> bool {
        matches!(self, Self::IncomingDamage | Self::IncomingHealing)
    }
}

/// Base value plus the value observed after active modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeData {
    pub base: f32,
    pub current: f32,
}

impl AttributeData {
    pub const fn new(value: f32) -> Self {
        Self {
            base: value,
            current: value,
        }
    }
}

/// One clamped resource (current/max pair plus meta attributes).
///
/// Invariants, held after every write:
/// - `max >= 1`
/// - `0 <= current <= max`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceSet {
    kind: ResourceKind,
    current: AttributeData,
    max: AttributeData,
    incoming_damage: AttributeData,
    incoming_healing: AttributeData,
    out_of_resource: bool,
}

impl ResourceSet {
    pub fn new(kind: ResourceKind, current: f32, max: f32) -> Self {
        let max = clamp_max(max);
        let current = clamp_current(current, 0.0, max);
        Self {
            kind,
            current: AttributeData::new(current),
            max: AttributeData::new(max),
            incoming_damage: AttributeData::default(),
            incoming_healing: AttributeData::default(),
            out_of_resource: current <= 0.0,
        }
    }

    pub fn from_config(kind: ResourceKind, config: &LedgerConfig) -> Self {
        match kind {
            ResourceKind::Health => {
                Self::new(kind, config.default_health, config.default_max_health)
            }
            ResourceKind::Mana => Self::new(kind, config.default_mana, config.default_max_mana),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn current(&self) -> f32 {
        self.current.current
    }

    pub fn max(&self) -> f32 {
        self.max.current
    }

    /// `current / max`, or 0 when max is not positive.
    pub fn normalized(&self) -> f32 {
        let max = self.max();
        if max > 0.0 { self.current() / max } else { 0.0 }
    }

    /// True while the last observed current value was at or below zero.
    pub fn is_out_of_resource(&self) -> bool {
        self.out_of_resource
    }

    pub fn data(&self, field: ResourceField) -> AttributeData {
        match field {
            ResourceField::Current => self.current,
            ResourceField::Max => self.max,
            ResourceField::IncomingDamage => self.incoming_damage,
            ResourceField::IncomingHealing => self.incoming_healing,
        }
    }

    pub(crate) fn data_mut(&mut self, field: ResourceField) -> &mut AttributeData {
        match field {
            ResourceField::Current => &mut self.current,
            ResourceField::Max => &mut self.max,
            ResourceField::IncomingDamage => &mut self.incoming_damage,
            ResourceField::IncomingHealing => &mut self.incoming_healing,
        }
    }

    /// Clamp a proposed value for `field`.
    ///
    /// - `Current` → `[0, max]`
    /// - `Max` → `[1, +inf)`
    /// - meta attributes are unclamped
    pub fn clamp(&self, field: ResourceField, value: f32) -> f32 {
        match field {
            ResourceField::Current => clamp_current(value, 0.0, self.max()),
            ResourceField::Max => clamp_max(value),
            ResourceField::IncomingDamage | ResourceField::IncomingHealing => {
                if value.is_nan() { 0.0 } else { value }
            }
        }
    }

    /// Records the depleted edge. Returns true exactly when the resource
    /// transitions into `<= 0`.
    pub(crate) fn observe_depletion(&mut self) -> bool {
        let depleted = self.current() <= 0.0;
        let edge = depleted && !self.out_of_resource;
        self.out_of_resource = depleted;
        edge
    }
}

/// Clamp into `[floor, max]`; NaN collapses to the floor.
pub(crate) fn clamp_current(value: f32, floor: f32, max: f32) -> f32 {
    if value.is_nan() {
        return floor;
    }
    value.max(floor).min(max.max(floor))
}

pub(crate) fn clamp_max(value: f32) -> f32 {
    if value.is_nan() {
        return LedgerConfig::MIN_MAX_VALUE;
    }
    value.max(LedgerConfig::MIN_MAX_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_enforces_invariants() {
        let set = ResourceSet::new(ResourceKind::Mana, 250.0, 0.0);
        assert_eq!(set.max(), 1.0);
        assert_eq!(set.current(), 1.0);

        let set = ResourceSet::new(ResourceKind::Health, -5.0, 80.0);
        assert_eq!(set.current(), 0.0);
        assert!(set.is_out_of_resource());
    }

    #[test]
    fn clamp_per_field() {
        let set = ResourceSet::new(ResourceKind::Mana, 50.0, 100.0);
        assert_eq!(set.clamp(ResourceField::Current, 130.0), 100.0);
        assert_eq!(set.clamp(ResourceField::Current, -1.0), 0.0);
        assert_eq!(set.clamp(ResourceField::Current, f32::NAN), 0.0);
        assert_eq!(set.clamp(ResourceField::Max, 0.25), 1.0);
        assert_eq!(set.clamp(ResourceField::Max, 500.0), 500.0);
        assert_eq!(set.clamp(ResourceField::IncomingDamage, 900.0), 900.0);
    }

    #[test]
    fn normalized_value() {
        let set = ResourceSet::new(ResourceKind::Health, 25.0, 100.0);
        assert_eq!(set.normalized(), 0.25);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Mana".parse::<ResourceKind>().ok(), Some(ResourceKind::Mana));
        assert_eq!(ResourceKind::Health.to_string(), "health");
    }
}
