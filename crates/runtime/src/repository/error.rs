//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("guild store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("{kind} is not part of this update")]
    NotInUpdate { kind: &'static str },

    #[error("store skipped the update for guild {guild}")]
    UpdateSkipped { guild: String },

    #[error("corrupted {kind} record for guild {guild}: {reason}")]
    CorruptedData {
        guild: String,
        kind: &'static str,
        reason: String,
    },
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
