//! External economy integration.
//!
//! Tickets gate draws and currency pays out boss rewards and sales. The real
//! system lives outside this process; the runtime only talks to it through
//! [`EconomyGateway`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use gacha_core::{GuildId, UserId};
use thiserror::Error;
use tokio::sync::Mutex;

/// Entitlement consumed by a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TicketKind {
    Single,
    Ten,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("economy service unavailable: {0}")]
    Unavailable(String),

    #[error("economy service rejected the request: {0}")]
    Rejected(String),

    #[error("economy service timed out")]
    TimedOut,
}

/// Tickets and currency owned by the external economy.
#[async_trait]
pub trait EconomyGateway: Send + Sync {
    /// Consume one ticket of `kind`. `Ok(false)` when the user has none.
    async fn take_ticket(
        &self,
        guild: GuildId,
        user: UserId,
        kind: TicketKind,
    ) -> Result<bool, GatewayError>;

    /// Give back a ticket taken for a draw that could not be recorded.
    async fn refund_ticket(
        &self,
        guild: GuildId,
        user: UserId,
        kind: TicketKind,
    ) -> Result<(), GatewayError>;

    /// Credit currency to a user's balance.
    async fn credit(&self, guild: GuildId, user: UserId, amount: u64) -> Result<(), GatewayError>;
}

/// Free tickets, credits only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEconomy;

#[async_trait]
impl EconomyGateway for NoopEconomy {
    async fn take_ticket(
        &self,
        _guild: GuildId,
        _user: UserId,
        _kind: TicketKind,
    ) -> Result<bool, GatewayError> {
        Ok(true)
    }

    async fn refund_ticket(
        &self,
        _guild: GuildId,
        _user: UserId,
        _kind: TicketKind,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn credit(&self, guild: GuildId, user: UserId, amount: u64) -> Result<(), GatewayError> {
        tracing::info!(%guild, %user, amount, "credit (noop economy)");
        Ok(())
    }
}

/// In-process ledger of tickets and balances.
///
/// Used by the terminal driver and tests. `set_offline(true)` makes every
/// call fail with [`GatewayError::Unavailable`].
#[derive(Debug, Default)]
pub struct LedgerEconomy {
    tickets: Mutex<HashMap<(GuildId, UserId, TicketKind), u32>>,
    balances: Mutex<HashMap<(GuildId, UserId), u64>>,
    offline: AtomicBool,
}

impl LedgerEconomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn grant_tickets(&self, guild: GuildId, user: UserId, kind: TicketKind, count: u32) {
        let mut tickets = self.tickets.lock().await;
        *tickets.entry((guild, user, kind)).or_default() += count;
    }

    pub async fn tickets(&self, guild: GuildId, user: UserId, kind: TicketKind) -> u32 {
        let tickets = self.tickets.lock().await;
        tickets.get(&(guild, user, kind)).copied().unwrap_or(0)
    }

    pub async fn balance(&self, guild: GuildId, user: UserId) -> u64 {
        let balances = self.balances.lock().await;
        balances.get(&(guild, user)).copied().unwrap_or(0)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("ledger offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EconomyGateway for LedgerEconomy {
    async fn take_ticket(
        &self,
        guild: GuildId,
        user: UserId,
        kind: TicketKind,
    ) -> Result<bool, GatewayError> {
        self.check_online()?;
        let mut tickets = self.tickets.lock().await;
        match tickets.get_mut(&(guild, user, kind)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn refund_ticket(
        &self,
        guild: GuildId,
        user: UserId,
        kind: TicketKind,
    ) -> Result<(), GatewayError> {
        self.check_online()?;
        self.grant_tickets(guild, user, kind, 1).await;
        Ok(())
    }

    async fn credit(&self, guild: GuildId, user: UserId, amount: u64) -> Result<(), GatewayError> {
        self.check_online()?;
        let mut balances = self.balances.lock().await;
        let balance = balances.entry((guild, user)).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}
