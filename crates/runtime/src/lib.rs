//! Host-side wiring for the resource ledger and inventory.
//!
//! `game-core` is synchronous and owns no collaborators; this crate supplies
//! them and hosts a [`Session`] that owns every spawned entity. Consumers
//! drive the session directly and subscribe to published messages through
//! the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the session, its builder, and entity snapshots
//! - [`events`] provides the topic-keyed broadcast bus
//! - [`oracle`] adapts loaded item content to the catalog trait
//! - [`repository`] persists inventories and ledgers between sessions
//! - [`quickbar`] is the slot service used on equippable pickups
pub mod error;
pub mod events;
pub mod oracle;
pub mod quickbar;
pub mod repository;
pub mod session;

pub use error::{Result, RuntimeError};
pub use events::{BusEvent, EventBus};
pub use oracle::ItemCatalogImpl;
pub use quickbar::QuickBar;
pub use repository::{FilePersistence, InMemoryPersistence, RepositoryError};
pub use session::{
    EntitySnapshot, ItemSnapshot, ResourceSnapshot, RuntimeConfig, Session, SessionBuilder,
    SyncReport,
};
