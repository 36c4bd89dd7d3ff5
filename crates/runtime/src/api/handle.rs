//! Cloneable façade over the runtime services.
//!
//! [`RuntimeHandle`] bundles the services a chat front end needs and offers
//! shortcuts for the most common commands.
use tokio::sync::broadcast;

use gacha_core::{Banner, GuildId, MessageId, PlayerAction, RewardItem, UserId};

use super::errors::Result;
use crate::combat::{CombatService, CombatSession, TurnOutcome};
use crate::events::{Event, EventBus, Topic};
use crate::services::{
    AdminService, DrawResult, DrawService, EconomyService, PityView, TenDrawResult,
};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    draw: DrawService,
    economy: EconomyService,
    admin: AdminService,
    combat: CombatService,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(
        draw: DrawService,
        economy: EconomyService,
        admin: AdminService,
        combat: CombatService,
        event_bus: EventBus,
    ) -> Self {
        Self {
            draw,
            economy,
            admin,
            combat,
            event_bus,
        }
    }

    pub fn draws(&self) -> &DrawService {
        &self.draw
    }

    pub fn economy(&self) -> &EconomyService {
        &self.economy
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn combat(&self) -> &CombatService {
        &self.combat
    }

    /// Spend a ticket on one draw.
    pub async fn draw(&self, guild: GuildId, user: UserId) -> Result<Option<DrawResult>> {
        self.draw.draw(guild, user).await
    }

    /// Spend a ten-ticket on ten sequential draws.
    pub async fn draw_ten(&self, guild: GuildId, user: UserId) -> Result<Option<TenDrawResult>> {
        self.draw.draw_ten(guild, user).await
    }

    pub fn pity(&self, guild: GuildId, user: UserId) -> Result<PityView> {
        self.draw.pity(guild, user)
    }

    /// Public odds; secret items are left out.
    pub fn banner(&self, guild: GuildId) -> Result<Banner> {
        let items: Vec<RewardItem> = self.admin.items(guild)?;
        Ok(Banner::from_items(&items))
    }

    pub async fn start_session(
        &self,
        guild: GuildId,
        user: UserId,
        boss: &str,
        party: &[&str],
    ) -> Result<CombatSession> {
        self.combat.start_session(guild, user, boss, party).await
    }

    pub async fn submit_action(
        &self,
        guild: GuildId,
        user: UserId,
        message: Option<MessageId>,
        action: PlayerAction,
    ) -> Result<TurnOutcome> {
        self.combat.submit_action(guild, user, message, action).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Draw` - Every drawn item
    /// - `Topic::Combat` - Battle start, turns and end
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
