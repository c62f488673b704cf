//! Hierarchical gameplay tags and tag counters.
//!
//! Tags are dot-separated keys (`Status.Death.Dying`). They categorize event
//! topics, immunity/cheat markers on an owner, and per-instance stat counters.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A hierarchical, dot-separated tag key.
///
/// Static tags are stored borrowed so they can be declared as constants;
/// tags parsed from content are owned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameplayTag(Cow<'static, str>);

impl GameplayTag {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` equals `parent` or is nested below it.
    ///
    /// `Gameplay.DamageImmunity.Mana` matches `Gameplay.DamageImmunity`,
    /// but `Gameplay.DamageImmunityX` does not.
    pub fn matches(&self, parent: &GameplayTag) -> bool {
        let own = self.as_str();
        let parent = parent.as_str();
        own == parent
            || (own.len() > parent.len()
                && own.starts_with(parent)
                && own.as_bytes()[parent.len()] == b'.')
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameplayTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Well-known tags
// ============================================================================

/// Damage to health is ignored while the owner carries this tag.
pub const DAMAGE_IMMUNITY_HEALTH: GameplayTag =
    GameplayTag::from_static("Gameplay.DamageImmunity.Health");
/// Damage to mana is ignored while the owner carries this tag.
pub const DAMAGE_IMMUNITY_MANA: GameplayTag =
    GameplayTag::from_static("Gameplay.DamageImmunity.Mana");
/// Dynamic effect tag: damage bypasses immunity and cheats.
pub const DAMAGE_SELF_DESTRUCT: GameplayTag =
    GameplayTag::from_static("Gameplay.Damage.SelfDestruct");
pub const DAMAGE_FELL_OUT_OF_WORLD: GameplayTag =
    GameplayTag::from_static("Gameplay.Damage.FellOutOfWorld");

pub const CHEAT_GOD_MODE: GameplayTag = GameplayTag::from_static("Cheat.GodMode");
pub const CHEAT_UNLIMITED_HEALTH: GameplayTag = GameplayTag::from_static("Cheat.UnlimitedHealth");
pub const CHEAT_UNLIMITED_MANA: GameplayTag = GameplayTag::from_static("Cheat.UnlimitedMana");

pub const STATUS_DEATH_DYING: GameplayTag = GameplayTag::from_static("Status.Death.Dying");
pub const STATUS_DEATH_DEAD: GameplayTag = GameplayTag::from_static("Status.Death.Dead");

pub const MESSAGE_DAMAGE: GameplayTag = GameplayTag::from_static("Gameplay.Message.Damage");
pub const MESSAGE_DAMAGE_MANA: GameplayTag =
    GameplayTag::from_static("Gameplay.Message.DamageMana");
pub const MESSAGE_OUT_OF_HEALTH: GameplayTag =
    GameplayTag::from_static("Gameplay.Message.OutOfHealth");
pub const MESSAGE_OUT_OF_MANA: GameplayTag =
    GameplayTag::from_static("Gameplay.Message.OutOfMana");

pub const INVENTORY_STACK_CHANGED: GameplayTag =
    GameplayTag::from_static("Inventory.Message.StackChanged");

pub const ABILITY_FAIL_ITEM_COST: GameplayTag =
    GameplayTag::from_static("Ability.ActivateFail.Cost");

// ============================================================================
// Containers
// ============================================================================

/// Ordered set of tags, used for captured source/target tag snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagSet {
    tags: BTreeSet<GameplayTag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: GameplayTag) -> bool {
        self.tags.insert(tag)
    }

    pub fn with(mut self, tag: GameplayTag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn has_exact(&self, tag: &GameplayTag) -> bool {
        self.tags.contains(tag)
    }

    /// Returns true if any contained tag matches `tag` hierarchically.
    pub fn has_matching(&self, tag: &GameplayTag) -> bool {
        self.tags.iter().any(|own| own.matches(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.tags.iter()
    }
}

impl FromIterator<GameplayTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

/// Integer counters keyed by tag.
///
/// Serves both as the owner's loose tag counts (immunity, cheats, death
/// markers) and as per-item-instance stat stacks. A tag whose count drops to
/// zero or below is removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagStackContainer {
    stacks: BTreeMap<GameplayTag, i32>,
}

impl TagStackContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` stacks to `tag`. Does nothing if `count < 1`.
    pub fn add_stack(&mut self, tag: GameplayTag, count: i32) {
        if count < 1 {
            tracing::warn!(%tag, count, "ignoring non-positive tag stack add");
            return;
        }
        *self.stacks.entry(tag).or_insert(0) += count;
    }

    /// Removes `count` stacks from `tag`. Does nothing if `count < 1`.
    pub fn remove_stack(&mut self, tag: &GameplayTag, count: i32) {
        if count < 1 {
            tracing::warn!(%tag, count, "ignoring non-positive tag stack remove");
            return;
        }
        if let Some(current) = self.stacks.get_mut(tag) {
            *current -= count;
            if *current <= 0 {
                self.stacks.remove(tag);
            }
        }
    }

    /// Overwrites the count for `tag`; a count of zero or less removes it.
    pub fn set_count(&mut self, tag: GameplayTag, count: i32) {
        if count <= 0 {
            self.stacks.remove(&tag);
        } else {
            self.stacks.insert(tag, count);
        }
    }

    /// Exact-key stack count, 0 if absent.
    pub fn count(&self, tag: &GameplayTag) -> i32 {
        self.stacks.get(tag).copied().unwrap_or(0)
    }

    pub fn contains(&self, tag: &GameplayTag) -> bool {
        self.stacks.contains_key(tag)
    }

    /// Hierarchical match against any present tag.
    pub fn has_matching(&self, tag: &GameplayTag) -> bool {
        self.stacks.keys().any(|own| own.matches(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GameplayTag, i32)> {
        self.stacks.iter().map(|(tag, count)| (tag, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Snapshot of present tags, used when capturing effect context tags.
    pub fn to_tag_set(&self) -> TagSet {
        self.stacks.keys().cloned().collect()
    }
}
