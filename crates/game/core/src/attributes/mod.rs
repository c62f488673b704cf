//! Resource ledger: clamped numeric attributes with derived events.
//!
//! The ledger owns one [`ResourceSet`] per [`ResourceKind`] (health, mana),
//! the source-side [`CombatSet`], and the owner's loose tag counts. Every
//! write flows through the same pipeline:
//!
//! ```text
//! pre-execute (immunity / god-mode rejection)
//!   → base change (clamped)
//!   → current recompute from active modifiers (clamped)
//!   → post attribute change (max shrink overrides current)
//!   → post-execute (meta attribute → signed delta on current, verb message,
//!     changed / depleted events)
//! ```

mod combat;
mod effect;
mod error;
mod event;
mod ledger;
mod modifier;
mod resource;

pub use combat::{CombatField, CombatSet};
pub use effect::{
    ActiveEffectHandle, EffectContext, EffectDuration, EffectOutcome, EffectSpec, ExecutedModifier,
    Execution,
};
pub use error::LedgerError;
pub use event::{AttributeChange, AttributeEvent};
pub use ledger::ResourceLedger;
pub use modifier::{Attribute, ModOp, Modifier};
pub use resource::{AttributeData, ResourceField, ResourceKind, ResourceSet};
