//! Outbound notifications.
//!
//! Two channels leave the core:
//! - [`EventSink`]: fire-and-forget, topic-keyed messages for unrelated
//!   systems (verb messages, stack-changed messages)
//! - [`Delegate`]: typed observer lists owned by a component (attribute
//!   changes, death transitions)
//!
//! Both dispatch synchronously, in the order the underlying state changed.

mod delegate;
mod message;
mod sink;

pub use delegate::{Delegate, SubscriptionId};
pub use message::{GameMessage, InventoryChangeMessage, VerbMessage};
pub use sink::{EventSink, MessageLog, NullSink};
