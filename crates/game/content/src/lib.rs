//! Data-driven content definitions and loaders.
//!
//! This crate reads static content from RON/TOML data files:
//! - Item catalogs (RON)
//! - Ledger configuration (TOML)
//!
//! Content is consumed by runtime collaborators (the item catalog, session
//! configuration) and never appears in ledger or inventory state.
//!
//! All loaders use game-core types directly with serde for deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, ItemLoader, LoadResult};
