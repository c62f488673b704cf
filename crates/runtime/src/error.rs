//! Unified error type surfaced by the session API.
//!
//! Wraps core rule failures and repository failures so clients can bubble
//! them up with consistent context.
use thiserror::Error;

use game_core::{
    AuthorityError, CharacterError, EntityId, ErrorSeverity, GameError, InventoryError,
    LedgerError,
};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("entity {0} is not part of this session")]
    UnknownEntity(EntityId),

    #[error("entity {0} was already spawned")]
    DuplicateEntity(EntityId),

    #[error("session requires an item catalog before building")]
    MissingCatalog,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CharacterError> for RuntimeError {
    fn from(err: CharacterError) -> Self {
        match err {
            CharacterError::Inventory(err) => Self::Inventory(err),
            CharacterError::Ledger(err) => Self::Ledger(err),
        }
    }
}

impl RuntimeError {
    /// Severity of the underlying failure; session-level lookups are
    /// validation errors.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownEntity(_) | Self::DuplicateEntity(_) => ErrorSeverity::Validation,
            Self::MissingCatalog | Self::Repository(_) => ErrorSeverity::Internal,
            Self::Ledger(err) => err.severity(),
            Self::Inventory(err) => err.severity(),
            Self::Authority(err) => err.severity(),
        }
    }
}
