use std::collections::HashMap;

use crate::ids::InstanceId;

use super::instance::ItemInstance;

/// Transport-agnostic change record for one inventory stack.
///
/// Observers must treat `Added` and `Removed` as resetting their per-stack
/// "last observed count"; a `Changed` whose count equals the last observed
/// count is a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InventoryDelta {
    Added(ItemInstance),
    Removed {
        instance: InstanceId,
        old_count: u32,
    },
    Changed {
        instance: InstanceId,
        old_count: u32,
        new_count: u32,
    },
}

impl InventoryDelta {
    pub fn instance(&self) -> InstanceId {
        match self {
            Self::Added(instance) => instance.id(),
            Self::Removed { instance, .. } | Self::Changed { instance, .. } => *instance,
        }
    }
}

/// Diff two snapshots of a list by instance id.
///
/// Records come out as: changed and added stacks in `after` order, then
/// removed stacks in `before` order.
pub fn diff_collection(before: &[ItemInstance], after: &[ItemInstance]) -> Vec<InventoryDelta> {
    let mut before_map: HashMap<InstanceId, &ItemInstance> =
        before.iter().map(|item| (item.id(), item)).collect();
    let mut delta = Vec::new();

    for entry in after {
        match before_map.remove(&entry.id()) {
            Some(prev) => {
                if prev.count() != entry.count() {
                    delta.push(InventoryDelta::Changed {
                        instance: entry.id(),
                        old_count: prev.count(),
                        new_count: entry.count(),
                    });
                }
            }
            None => delta.push(InventoryDelta::Added(entry.clone())),
        }
    }

    delta.extend(
        before
            .iter()
            .filter(|item| before_map.contains_key(&item.id()))
            .map(|item| InventoryDelta::Removed {
                instance: item.id(),
                old_count: item.count(),
            }),
    );
    delta
}
