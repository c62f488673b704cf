//! Runtime wrappers around static game content.
//!
//! Item definitions are immutable while a session runs; dynamic state lives
//! in the entities the session owns.
mod items;

pub use items::ItemCatalogImpl;
