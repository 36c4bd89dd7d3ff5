//! Draw service: tickets, pity, collections and side rewards.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use gacha_core::{
    Claim, Collection, DrawEngine, DrawOutcome, GuildId, PityState, RewardItem, TenDraw,
    TokenWallet, UserId,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::{Result, RuntimeError};
use crate::events::{DrawEvent, Event, EventBus};
use crate::providers::{EconomyGateway, TicketKind};
use crate::repository::{Documents, GuildRecords, RecordKind};
use crate::services::{SharedRng, UserLocks};

/// One draw with its side rewards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub outcome: DrawOutcome,
    pub claim: Claim,
    /// Pity after the draw.
    pub pity: PityState,
    /// Flavor text picked for this draw.
    pub reply: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenDrawResult {
    pub batch: TenDraw,
    /// Side rewards, index-aligned with `batch.draws`.
    pub claims: Vec<Claim>,
    pub pity: PityState,
}

/// Read-only pity inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PityView {
    pub state: PityState,
    pub pity_max: u32,
    pub draws_until_guarantee: u32,
    pub total_spins: u64,
}

/// Documents a draw reads and writes, updated together.
const DRAW_RECORDS: [RecordKind; 5] = [
    RecordKind::Pity,
    RecordKind::Collectables,
    RecordKind::Tokens,
    RecordKind::Unlocks,
    RecordKind::TotalSpins,
];

/// Everything a draw reads and writes for one user.
struct UserDrawState {
    pity: PityState,
    collection: Collection,
    wallet: TokenWallet,
    unlocks: BTreeSet<String>,
    total_spins: u64,
}

impl UserDrawState {
    fn load(documents: &Documents<'_>, user: UserId) -> Result<Self> {
        Ok(Self {
            pity: documents.user(RecordKind::Pity, user)?,
            collection: documents.user(RecordKind::Collectables, user)?,
            wallet: documents.user(RecordKind::Tokens, user)?,
            unlocks: documents.user(RecordKind::Unlocks, user)?,
            total_spins: documents.user(RecordKind::TotalSpins, user)?,
        })
    }

    fn save(&self, documents: &mut Documents<'_>, user: UserId) -> Result<()> {
        documents.set_user(RecordKind::Pity, user, &self.pity)?;
        documents.set_user(RecordKind::Collectables, user, &self.collection)?;
        documents.set_user(RecordKind::Tokens, user, &self.wallet)?;
        documents.set_user(RecordKind::Unlocks, user, &self.unlocks)?;
        documents.set_user(RecordKind::TotalSpins, user, &self.total_spins)?;
        Ok(())
    }

    /// Duplicate detection, token and unlock grants for one drawn item.
    fn claim(&mut self, outcome: &DrawOutcome) -> Claim {
        let item = &outcome.item;
        let unlocked = item
            .unlock_marker
            .as_ref()
            .is_some_and(|marker| self.unlocks.contains(marker));
        let copies = self.collection.count(&item.name);

        let claim = Claim::evaluate(item, unlocked, copies);
        if let Some(rarity) = claim.token {
            self.wallet.add(rarity, 1);
        }
        if let Some(marker) = &claim.unlock {
            self.unlocks.insert(marker.clone());
        }
        claim
    }
}

/// Single and ten draws for guild members.
#[derive(Clone)]
pub struct DrawService {
    records: GuildRecords,
    economy: Arc<dyn EconomyGateway>,
    rng: SharedRng,
    locks: UserLocks,
    events: EventBus,
    cooldown: Duration,
    last_draw: Arc<Mutex<HashMap<(GuildId, UserId), Instant>>>,
}

impl DrawService {
    pub fn new(
        records: GuildRecords,
        economy: Arc<dyn EconomyGateway>,
        rng: SharedRng,
        locks: UserLocks,
        events: EventBus,
        cooldown: Duration,
    ) -> Self {
        Self {
            records,
            economy,
            rng,
            locks,
            events,
            cooldown,
            last_draw: Arc::default(),
        }
    }

    /// One draw. `Ok(None)` when the guild has no items configured; no ticket
    /// is consumed in that case.
    ///
    /// The ticket is taken before the user's records are updated and given
    /// back when the update fails.
    pub async fn draw(&self, guild: GuildId, user: UserId) -> Result<Option<DrawResult>> {
        let _guard = self.locks.lock(guild, user).await;
        self.check_cooldown(guild, user).await?;

        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        if items.is_empty() {
            return Ok(None);
        }
        let engine = DrawEngine::new(&items, self.records.pity_max(guild)?);
        self.take_ticket(guild, user, TicketKind::Single).await?;

        let recorded: Result<Option<DrawResult>> = {
            let mut rng = self.rng.lock().await;
            self.records.transaction(guild, &DRAW_RECORDS, |documents| {
                let mut state = UserDrawState::load(documents, user)?;
                let Some(outcome) =
                    engine.draw(&mut state.pity, &mut state.collection, rng.as_mut())
                else {
                    return Ok(None);
                };
                let claim = state.claim(&outcome);
                state.total_spins += 1;
                state.save(documents, user)?;
                let reply = outcome.item.draw_reply(rng.as_mut()).map(str::to_string);
                Ok(Some(DrawResult {
                    outcome,
                    claim,
                    pity: state.pity,
                    reply,
                }))
            })
        };
        let result = match recorded {
            Ok(Some(result)) => result,
            Ok(None) => {
                self.refund_ticket(guild, user, TicketKind::Single).await;
                return Ok(None);
            }
            Err(err) => {
                self.refund_ticket(guild, user, TicketKind::Single).await;
                return Err(err);
            }
        };
        self.mark_draw(guild, user).await;

        tracing::info!(
            %guild, %user,
            item = %result.outcome.item.name,
            rarity = %result.outcome.item.rarity,
            forced = result.outcome.forced,
            "draw"
        );
        self.publish(guild, user, &result.outcome);

        Ok(Some(result))
    }

    /// Ten sequential draws for one ten-ticket. Every draw sees the pity left
    /// by the one before it.
    pub async fn draw_ten(&self, guild: GuildId, user: UserId) -> Result<Option<TenDrawResult>> {
        let _guard = self.locks.lock(guild, user).await;
        self.check_cooldown(guild, user).await?;

        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        if items.is_empty() {
            return Ok(None);
        }
        let engine = DrawEngine::new(&items, self.records.pity_max(guild)?);
        self.take_ticket(guild, user, TicketKind::Ten).await?;

        let recorded: Result<Option<TenDrawResult>> = {
            let mut rng = self.rng.lock().await;
            self.records.transaction(guild, &DRAW_RECORDS, |documents| {
                let mut state = UserDrawState::load(documents, user)?;
                let Some(batch) =
                    engine.draw_ten(&mut state.pity, &mut state.collection, rng.as_mut())
                else {
                    return Ok(None);
                };
                let claims: Vec<Claim> = batch.draws.iter().map(|d| state.claim(d)).collect();
                state.total_spins += batch.draws.len() as u64;
                state.save(documents, user)?;
                Ok(Some(TenDrawResult {
                    batch,
                    claims,
                    pity: state.pity,
                }))
            })
        };
        let result = match recorded {
            Ok(Some(result)) => result,
            Ok(None) => {
                self.refund_ticket(guild, user, TicketKind::Ten).await;
                return Ok(None);
            }
            Err(err) => {
                self.refund_ticket(guild, user, TicketKind::Ten).await;
                return Err(err);
            }
        };
        self.mark_draw(guild, user).await;

        tracing::info!(
            %guild, %user,
            headline = %result.batch.headline().item.name,
            rarity = %result.batch.headline().item.rarity,
            "ten draw"
        );
        for outcome in &result.batch.draws {
            self.publish(guild, user, outcome);
        }

        Ok(Some(result))
    }

    pub fn pity(&self, guild: GuildId, user: UserId) -> Result<PityView> {
        let state: PityState = self.records.user(guild, RecordKind::Pity, user)?;
        let pity_max = self.records.pity_max(guild)?;
        Ok(PityView {
            state,
            pity_max,
            draws_until_guarantee: state.draws_until_guarantee(pity_max),
            total_spins: self.records.user(guild, RecordKind::TotalSpins, user)?,
        })
    }

    async fn check_cooldown(&self, guild: GuildId, user: UserId) -> Result<()> {
        if self.cooldown.is_zero() {
            return Ok(());
        }
        let last_draw = self.last_draw.lock().await;
        if let Some(at) = last_draw.get(&(guild, user)) {
            let elapsed = at.elapsed();
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                return Err(RuntimeError::DrawCooldown {
                    remaining_secs: remaining.as_secs_f64().ceil() as u64,
                });
            }
        }
        Ok(())
    }

    async fn mark_draw(&self, guild: GuildId, user: UserId) {
        if self.cooldown.is_zero() {
            return;
        }
        let mut last_draw = self.last_draw.lock().await;
        let cooldown = self.cooldown;
        last_draw.retain(|_, at| at.elapsed() < cooldown);
        last_draw.insert((guild, user), Instant::now());
    }

    async fn take_ticket(&self, guild: GuildId, user: UserId, kind: TicketKind) -> Result<()> {
        match self.economy.take_ticket(guild, user, kind).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RuntimeError::NoTicket),
            Err(err) => {
                tracing::warn!(%guild, %user, %kind, error = %err, "ticket check failed");
                Err(RuntimeError::Gateway(err))
            }
        }
    }

    async fn refund_ticket(&self, guild: GuildId, user: UserId, kind: TicketKind) {
        match self.economy.refund_ticket(guild, user, kind).await {
            Ok(()) => tracing::warn!(%guild, %user, %kind, "draw not recorded, ticket refunded"),
            Err(err) => {
                tracing::error!(%guild, %user, %kind, error = %err, "draw not recorded, ticket refund failed");
            }
        }
    }

    fn publish(&self, guild: GuildId, user: UserId, outcome: &DrawOutcome) {
        self.events.publish(Event::Draw(DrawEvent {
            guild,
            user,
            item: outcome.item.name.clone(),
            rarity: outcome.item.rarity,
            forced: outcome.forced,
        }));
    }
}
