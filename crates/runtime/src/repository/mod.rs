//! Persistence backends for the core save/load hooks.
//!
//! The hooks are infallible from the core's point of view, so backends log
//! failures and carry on; a failed save never rolls back a mutation.
mod error;
mod file;
mod memory;

pub use error::{RepositoryError, Result};
pub use file::FilePersistence;
pub use memory::InMemoryPersistence;
