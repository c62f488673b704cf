//! Fixed-size quick-access bar.
//!
//! Equippable pickups land in the first free slot and that slot becomes
//! active. The bar is sized once from [`LedgerConfig::quick_bar_slots`] and
//! never grows.

use arrayvec::ArrayVec;

use game_core::{InstanceId, LedgerConfig, SlotAssignment};

const CAPACITY: usize = LedgerConfig::MAX_QUICK_BAR_SLOTS;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuickBar {
    slots: ArrayVec<Option<InstanceId>, CAPACITY>,
    active: Option<usize>,
}

impl QuickBar {
    /// Creates a bar with `size` empty slots, limited to the fixed capacity.
    pub fn new(size: usize) -> Self {
        let size = size.min(CAPACITY);
        let mut slots = ArrayVec::new();
        for _ in 0..size {
            slots.push(None);
        }
        Self {
            slots,
            active: None,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.effective_quick_bar_slots())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<InstanceId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<InstanceId>] {
        &self.slots
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_instance(&self) -> Option<InstanceId> {
        self.active.and_then(|index| self.slot(index))
    }

    /// Empties the slot holding `instance`, clearing the active index if it
    /// pointed there. Returns the freed index.
    pub fn clear_instance(&mut self, instance: InstanceId) -> Option<usize> {
        let index = self.slots.iter().position(|slot| *slot == Some(instance))?;
        self.slots[index] = None;
        if self.active == Some(index) {
            self.active = None;
        }
        Some(index)
    }
}

impl SlotAssignment for QuickBar {
    fn next_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    fn assign(&mut self, index: usize, instance: InstanceId) {
        match self.slots.get_mut(index) {
            Some(slot) => *slot = Some(instance),
            None => tracing::warn!(index, %instance, "quick bar slot out of range"),
        }
    }

    fn set_active(&mut self, index: usize) {
        if index < self.slots.len() {
            self.active = Some(index);
        } else {
            tracing::warn!(index, "quick bar active index out of range");
        }
    }

    fn is_assigned(&self, instance: InstanceId) -> bool {
        self.slots.contains(&Some(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_capped_at_capacity() {
        assert_eq!(QuickBar::new(64).len(), CAPACITY);
        assert_eq!(QuickBar::new(0).next_free_slot(), None);
    }

    #[test]
    fn fills_first_free_slot_and_tracks_active() {
        let mut bar = QuickBar::new(3);
        bar.assign(0, InstanceId(7));
        assert_eq!(bar.next_free_slot(), Some(1));

        bar.assign(1, InstanceId(8));
        bar.set_active(1);
        assert_eq!(bar.active_instance(), Some(InstanceId(8)));
        assert!(bar.is_assigned(InstanceId(7)));

        assert_eq!(bar.clear_instance(InstanceId(8)), Some(1));
        assert_eq!(bar.active(), None);
        assert_eq!(bar.next_free_slot(), Some(1));
    }

    #[test]
    fn out_of_range_requests_are_ignored() {
        let mut bar = QuickBar::new(1);
        bar.assign(5, InstanceId(1));
        bar.set_active(5);
        assert_eq!(bar.slot(0), None);
        assert_eq!(bar.active(), None);
    }
}
