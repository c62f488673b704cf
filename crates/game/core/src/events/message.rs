use crate::ids::{EntityId, InstanceId, ItemDefId};
use crate::tags::{GameplayTag, TagSet};

/// Payload published through an [`EventSink`](super::EventSink).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMessage {
    Verb(VerbMessage),
    StackChanged(InventoryChangeMessage),
}

/// Structured description of a gameplay occurrence (damage dealt, resource
/// exhausted) for consumption by UI, analytics, and other observers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbMessage {
    pub verb: GameplayTag,
    pub instigator: Option<EntityId>,
    pub instigator_tags: TagSet,
    pub target: EntityId,
    pub target_tags: TagSet,
    pub magnitude: f32,
}

/// One stack changed in an inventory.
///
/// `delta` is signed: positive for additions, negative for removals.
/// `new_count == 0` means the stack left the inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryChangeMessage {
    pub owner: EntityId,
    pub instance: InstanceId,
    pub item: ItemDefId,
    pub new_count: u32,
    pub delta: i64,
}
