use super::effect::ActiveEffectHandle;
use super::modifier::Attribute;
use crate::authority::AuthorityError;
use crate::error::{ErrorSeverity, GameError};
use crate::ids::EntityId;

/// Rejections raised by [`ResourceLedger`](super::ResourceLedger) mutators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error("no active effect with handle {0:?}")]
    UnknownEffect(ActiveEffectHandle),

    /// Meta attributes are consumed by post-execute and cannot hold a
    /// persistent value.
    #[error("{attribute} is a meta attribute and cannot be modified persistently")]
    NotPersistent { attribute: Attribute },

    #[error("infinite effects cannot carry executions")]
    ExecutionInInfiniteEffect,

    #[error("replicated values cannot be applied on the authority for {owner}")]
    ReplicatedOnAuthority { owner: EntityId },

    #[error("{attribute} is not replicated")]
    NotReplicated { attribute: Attribute },
}

impl GameError for LedgerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Authority(err) => err.severity(),
            Self::UnknownEffect(_) => ErrorSeverity::Recoverable,
            Self::NotPersistent { .. }
            | Self::ExecutionInInfiniteEffect
            | Self::NotReplicated { .. } => ErrorSeverity::Validation,
            Self::ReplicatedOnAuthority { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Authority(err) => err.error_code(),
            Self::UnknownEffect(_) => "LEDGER_UNKNOWN_EFFECT",
            Self::NotPersistent { .. } => "LEDGER_NOT_PERSISTENT",
            Self::ExecutionInInfiniteEffect => "LEDGER_EXECUTION_IN_INFINITE_EFFECT",
            Self::ReplicatedOnAuthority { .. } => "LEDGER_REPLICATED_ON_AUTHORITY",
            Self::NotReplicated { .. } => "LEDGER_NOT_REPLICATED",
        }
    }
}
