//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the rules, repositories and the economy gateway so
//! clients can bubble them up with consistent context. Every variant maps to
//! an [`ErrorSeverity`]; none of them is fatal to the process.

use gacha_core::{
    ActionError, ErrorSeverity, ExchangeError, GameError, GuildId, InsufficientCopies,
    ValidationError,
};
use thiserror::Error;

pub use crate::repository::RepositoryError;
use crate::providers::GatewayError;

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Copies(#[from] InsufficientCopies),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("economy gateway failed: {0}")]
    Gateway(#[source] GatewayError),

    #[error("no ticket available for this draw")]
    NoTicket,

    #[error("spinning too fast, try again in {remaining_secs}s")]
    DrawCooldown { remaining_secs: u64 },

    #[error("no active battle")]
    NoSession,

    #[error("this action belongs to a different battle message")]
    ForeignMessage,

    #[error("`{0}` cannot be sold")]
    NotSellable(String),

    #[error("`{0}` has not been unlocked")]
    NotOwned(String),

    #[error("no pending confirmation")]
    NothingToConfirm,

    #[error("a battle is already in progress")]
    SessionExists,

    #[error("guild {guild} already has {limit} battles in progress")]
    GuildAtCapacity { guild: GuildId, limit: usize },

    #[error("session registry is shut down")]
    RegistryClosed,

    #[error("worker task failed to join")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(err) => err.severity(),
            Self::Action(err) => err.severity(),
            Self::Exchange(err) => err.severity(),
            Self::Copies(_)
            | Self::NoTicket
            | Self::DrawCooldown { .. }
            | Self::NoSession
            | Self::ForeignMessage
            | Self::NotSellable(_)
            | Self::NotOwned(_)
            | Self::NothingToConfirm => ErrorSeverity::Precondition,
            Self::SessionExists | Self::GuildAtCapacity { .. } | Self::RegistryClosed => {
                ErrorSeverity::ConcurrencyLimit
            }
            Self::Gateway(_) => ErrorSeverity::Integration,
            Self::Repository(_) | Self::WorkerJoin(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.error_code(),
            Self::Action(err) => err.error_code(),
            Self::Exchange(err) => err.error_code(),
            Self::Copies(_) => "INSUFFICIENT_COPIES",
            Self::Repository(_) => "REPOSITORY",
            Self::Gateway(_) => "GATEWAY",
            Self::NoTicket => "NO_TICKET",
            Self::DrawCooldown { .. } => "DRAW_COOLDOWN",
            Self::NoSession => "NO_SESSION",
            Self::ForeignMessage => "FOREIGN_MESSAGE",
            Self::NotSellable(_) => "NOT_SELLABLE",
            Self::NotOwned(_) => "NOT_OWNED",
            Self::NothingToConfirm => "NOTHING_TO_CONFIRM",
            Self::SessionExists => "SESSION_EXISTS",
            Self::GuildAtCapacity { .. } => "GUILD_AT_CAPACITY",
            Self::RegistryClosed => "REGISTRY_CLOSED",
            Self::WorkerJoin(_) => "WORKER_JOIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_follow_the_taxonomy() {
        assert_eq!(
            RuntimeError::from(ValidationError::ZeroWeight).severity(),
            ErrorSeverity::Validation
        );
        assert_eq!(RuntimeError::NoSession.severity(), ErrorSeverity::Precondition);
        assert_eq!(
            RuntimeError::GuildAtCapacity { guild: GuildId(1), limit: 5 }.severity(),
            ErrorSeverity::ConcurrencyLimit
        );
        assert_eq!(
            RuntimeError::Gateway(GatewayError::TimedOut).severity(),
            ErrorSeverity::Integration
        );
        assert_eq!(RuntimeError::SessionExists.error_code(), "SESSION_EXISTS");
    }
}
