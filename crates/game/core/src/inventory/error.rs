use crate::authority::AuthorityError;
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{InstanceId, ItemDefId};

/// Precondition rejections of inventory mutators. Nothing was changed and
/// nothing was published when one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error("unknown item definition '{0}'")]
    UnknownItem(ItemDefId),

    #[error("item '{item}' has a zero stack limit")]
    InvalidStackLimit { item: ItemDefId },

    #[error("not enough '{item}': requested {requested}, available {available}")]
    InsufficientItems {
        item: ItemDefId,
        requested: u32,
        available: u64,
    },

    #[error("stack of {count} '{item}' does not fit a stack limit of {stack_limit}")]
    InvalidStackCount {
        item: ItemDefId,
        count: u32,
        stack_limit: u32,
    },

    #[error("no stack {0} in this inventory")]
    UnknownInstance(InstanceId),
}

impl GameError for InventoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Authority(err) => err.severity(),
            Self::InsufficientItems { .. } => ErrorSeverity::Recoverable,
            Self::InvalidStackLimit { .. }
            | Self::InvalidStackCount { .. }
            | Self::UnknownInstance(_) => ErrorSeverity::Validation,
            Self::UnknownItem(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Authority(err) => err.error_code(),
            Self::UnknownItem(_) => "INVENTORY_UNKNOWN_ITEM",
            Self::InvalidStackLimit { .. } => "INVENTORY_INVALID_STACK_LIMIT",
            Self::InsufficientItems { .. } => "INVENTORY_INSUFFICIENT_ITEMS",
            Self::InvalidStackCount { .. } => "INVENTORY_INVALID_STACK_COUNT",
            Self::UnknownInstance(_) => "INVENTORY_UNKNOWN_INSTANCE",
        }
    }
}
