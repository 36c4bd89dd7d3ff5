//! Two-step confirmation for destructive admin commands.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use gacha_core::{GuildId, RewardItem, UserId};
use tokio::time::Instant;

use crate::repository::RepositoryError;

/// How long a request waits for `confirm` before it lapses.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Destructive operation waiting for its requester to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    DeleteItem { item: String },
    ResetItems,
    ResetTokens,
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteItem { item } => write!(f, "delete item {item}"),
            Self::ResetItems => f.write_str("reset items"),
            Self::ResetTokens => f.write_str("reset tokens"),
        }
    }
}

impl PendingOperation {
    fn slot(&self) -> usize {
        match self {
            Self::DeleteItem { .. } => 0,
            Self::ResetItems => 1,
            Self::ResetTokens => 2,
        }
    }
}

/// What a confirmation carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmedOperation {
    ItemDeleted(RewardItem),
    ItemsReset,
    TokensReset,
}

#[derive(Debug)]
struct Pending {
    operation: PendingOperation,
    expires_at: Instant,
}

type Key = (GuildId, UserId, usize);

const SLOTS: usize = 3;

/// Pending requests keyed by guild, requester and operation kind.
///
/// A requester may hold one request of each kind; `take` resolves them in
/// delete, reset-items, reset-tokens order. Expired requests are dropped
/// whenever the table is touched.
#[derive(Clone)]
pub struct Confirmations {
    pending: Arc<Mutex<HashMap<Key, Pending>>>,
    timeout: Duration,
}

impl Confirmations {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Arc::default(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<Key, Pending>>, RepositoryError> {
        let mut table = self
            .pending
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let now = Instant::now();
        table.retain(|_, pending| pending.expires_at > now);
        Ok(table)
    }

    /// Register `operation`, replacing an earlier request of the same kind.
    pub fn request(
        &self,
        guild: GuildId,
        admin: UserId,
        operation: PendingOperation,
    ) -> Result<(), RepositoryError> {
        let expires_at = Instant::now() + self.timeout;
        self.table()?.insert(
            (guild, admin, operation.slot()),
            Pending {
                operation,
                expires_at,
            },
        );
        Ok(())
    }

    /// Remove and return the requester's next live request.
    pub fn take(
        &self,
        guild: GuildId,
        admin: UserId,
    ) -> Result<Option<PendingOperation>, RepositoryError> {
        let mut table = self.table()?;
        Ok((0..SLOTS)
            .find_map(|slot| table.remove(&(guild, admin, slot)))
            .map(|pending| pending.operation))
    }
}

impl Default for Confirmations {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId(1);
    const ADMIN: UserId = UserId(9);

    #[tokio::test(start_paused = true)]
    async fn requests_lapse_after_the_timeout() {
        let confirmations = Confirmations::new(Duration::from_secs(30));
        confirmations.request(GUILD, ADMIN, PendingOperation::ResetItems).unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(confirmations.take(GUILD, ADMIN).unwrap(), None);
    }

    #[test]
    fn requests_are_per_requester_and_ordered() {
        let confirmations = Confirmations::default();
        confirmations.request(GUILD, ADMIN, PendingOperation::ResetTokens).unwrap();
        confirmations
            .request(GUILD, ADMIN, PendingOperation::DeleteItem { item: "Coin".into() })
            .unwrap();

        assert_eq!(confirmations.take(GUILD, UserId(10)).unwrap(), None);
        assert_eq!(
            confirmations.take(GUILD, ADMIN).unwrap(),
            Some(PendingOperation::DeleteItem { item: "Coin".into() })
        );
        assert_eq!(
            confirmations.take(GUILD, ADMIN).unwrap(),
            Some(PendingOperation::ResetTokens)
        );
        assert_eq!(confirmations.take(GUILD, ADMIN).unwrap(), None);
    }
}
