//! Source-side magnitudes captured by executions.

use super::resource::AttributeData;

/// Members of [`CombatSet`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatField {
    BaseDamage,
    BaseDamageMana,
    BaseHeal,
    BaseHealMana,
}

/// Base magnitudes an instigator contributes to damage and heal executions.
///
/// The values are unclamped; executions floor the captured magnitude at 0.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSet {
    base_damage: AttributeData,
    base_damage_mana: AttributeData,
    base_heal: AttributeData,
    base_heal_mana: AttributeData,
}

impl CombatSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for both base and current value of `field`.
    pub fn with(mut self, field: CombatField, value: f32) -> Self {
        *self.data_mut(field) = AttributeData::new(value);
        self
    }

    pub fn get(&self, field: CombatField) -> f32 {
        self.data(field).current
    }

    pub fn data(&self, field: CombatField) -> AttributeData {
        match field {
            CombatField::BaseDamage => self.base_damage,
            CombatField::BaseDamageMana => self.base_damage_mana,
            CombatField::BaseHeal => self.base_heal,
            CombatField::BaseHealMana => self.base_heal_mana,
        }
    }

    pub(crate) fn data_mut(&mut self, field: CombatField) -> &mut AttributeData {
        match field {
            CombatField::BaseDamage => &mut self.base_damage,
            CombatField::BaseDamageMana => &mut self.base_damage_mana,
            CombatField::BaseHeal => &mut self.base_heal,
            CombatField::BaseHealMana => &mut self.base_heal_mana,
        }
    }
}
