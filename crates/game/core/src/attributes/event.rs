use super::effect::EffectContext;
use super::resource::ResourceKind;
use crate::ids::EntityId;

/// Payload shared by every attribute event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeChange {
    pub owner: EntityId,
    pub kind: ResourceKind,
    /// `new_value - old_value`.
    pub magnitude: f32,
    pub old_value: f32,
    pub new_value: f32,
    /// Effect that caused the change; `None` for replicated or internal
    /// corrections.
    pub context: Option<EffectContext>,
}

/// Notifications broadcast by a ledger after each mutating call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeEvent {
    /// `current` differs from its pre-change snapshot.
    Changed(AttributeChange),
    MaxChanged(AttributeChange),
    /// `current` crossed from above zero to zero or below. Edge-triggered.
    Depleted(AttributeChange),
}

impl AttributeEvent {
    pub fn change(&self) -> &AttributeChange {
        match self {
            Self::Changed(change) | Self::MaxChanged(change) | Self::Depleted(change) => change,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.change().kind
    }
}
