//! Single-writer capability check.
//!
//! Exactly one execution context (the authority) may mutate an entity's
//! ledger, death state, or inventory. Replicas only read derived state and
//! react to change notifications. Every mutator calls [`ensure_authority`]
//! before touching state.

use crate::error::{ErrorSeverity, GameError};
use crate::ids::EntityId;

/// Network role of the context holding a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetRole {
    /// Owner of truth for this entity; may mutate.
    #[default]
    Authority,
    /// Read-only observer; receives replicated state.
    Replica,
}

impl NetRole {
    #[inline]
    pub const fn is_authority(self) -> bool {
        matches!(self, Self::Authority)
    }
}

/// A mutator was invoked outside the authority context.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{operation} on {owner} requires authority")]
pub struct AuthorityError {
    pub owner: EntityId,
    pub operation: &'static str,
}

impl GameError for AuthorityError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "AUTHORITY_REQUIRED"
    }
}

/// Rejects the call unless `role` is the authority.
pub fn ensure_authority(
    role: NetRole,
    owner: EntityId,
    operation: &'static str,
) -> Result<(), AuthorityError> {
    if role.is_authority() {
        Ok(())
    } else {
        tracing::warn!(%owner, operation, "rejected mutation from non-authority context");
        Err(AuthorityError { owner, operation })
    }
}
