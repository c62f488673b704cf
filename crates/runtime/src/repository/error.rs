//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("save file {path} belongs to entity {found}, expected {expected}")]
    OwnerMismatch {
        path: String,
        expected: game_core::EntityId,
        found: game_core::EntityId,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
