//! Starting battles and resolving player actions.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use gacha_core::{
    Battle, Boss, BossFighter, BattleStatus, CombatCharacter, CommonSkill, Fighter, GameConfig,
    GuildId, MessageId, PlayerAction, RewardItem, TurnReport, UserId, ValidationError,
    find_by_name,
};

use crate::api::{Result, RuntimeError};
use crate::combat::{CombatSession, SessionKey, SessionRegistry};
use crate::providers::{EconomyGateway, GatewayError};
use crate::repository::{GuildRecords, RecordKind};

/// Result of paying out a boss reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutStatus {
    Paid { amount: u64 },
    /// The battle is still won; only the credit failed.
    Failed { amount: u64, reason: String },
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub report: TurnReport,
    /// Session state after the turn. Already removed from the registry when
    /// the battle ended.
    pub session: CombatSession,
    /// Set on victory against a boss with a reward.
    pub payout: Option<PayoutStatus>,
}

#[derive(Clone)]
pub struct CombatService {
    records: GuildRecords,
    registry: SessionRegistry,
    economy: Arc<dyn EconomyGateway>,
    base_config: GameConfig,
    payout_timeout: Duration,
}

impl CombatService {
    pub fn new(
        records: GuildRecords,
        registry: SessionRegistry,
        economy: Arc<dyn EconomyGateway>,
        base_config: GameConfig,
        payout_timeout: Duration,
    ) -> Self {
        Self {
            records,
            registry,
            economy,
            base_config,
            payout_timeout,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Start a battle against `boss_query` with the named characters, in
    /// party order.
    ///
    /// Characters are matched by partial name and deduplicated. A character
    /// whose item carries an unlock marker must have been unlocked by the
    /// user.
    pub async fn start_session(
        &self,
        guild: GuildId,
        user: UserId,
        boss_query: &str,
        party: &[&str],
    ) -> Result<CombatSession> {
        let key = SessionKey::new(guild, user);
        if self.registry.get(key).await?.is_some() {
            return Err(RuntimeError::SessionExists);
        }

        let bosses: Vec<Boss> = self.records.list(guild, RecordKind::Bosses)?;
        let boss = find_by_name(&bosses, boss_query).ok_or_else(|| ValidationError::NotFound {
            kind: "boss",
            name: boss_query.to_string(),
        })?;

        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        let skills: Vec<CommonSkill> = self.records.list(guild, RecordKind::CommonSkills)?;
        let unlocks: BTreeSet<String> = self.records.user(guild, RecordKind::Unlocks, user)?;

        let mut seen = BTreeSet::new();
        let mut fighters = Vec::with_capacity(party.len());
        for query in party {
            let item = find_by_name(&items, query).ok_or_else(|| ValidationError::NotFound {
                kind: "character",
                name: query.to_string(),
            })?;
            if !seen.insert(item.name.clone()) {
                continue;
            }
            let locked = item
                .unlock_marker
                .as_ref()
                .is_some_and(|marker| !unlocks.contains(marker));
            if locked {
                return Err(RuntimeError::NotOwned(item.name.clone()));
            }
            let character = CombatCharacter::from_item(item)?;
            fighters.push(Fighter::new(character, &skills));
        }

        let config = self.records.game_config(guild, &self.base_config)?;
        let battle = Battle::new(BossFighter::new(boss.clone()), fighters, &config)?;
        self.registry.create(key, battle).await
    }

    /// Apply one player action to the user's battle.
    ///
    /// `message` is the interaction's source message, if any; it must match
    /// the message bound to the session.
    pub async fn submit_action(
        &self,
        guild: GuildId,
        user: UserId,
        message: Option<MessageId>,
        action: PlayerAction,
    ) -> Result<TurnOutcome> {
        let advanced = self
            .registry
            .advance(SessionKey::new(guild, user), message, action)
            .await?;

        let payout = if advanced.report.status == BattleStatus::Victory {
            self.pay_reward(guild, user, advanced.session.battle.boss().profile.reward)
                .await
        } else {
            None
        };

        Ok(TurnOutcome {
            report: advanced.report,
            session: advanced.session,
            payout,
        })
    }

    /// Credits the boss reward. The session is already gone; a failure is
    /// logged and reported, never raised.
    async fn pay_reward(&self, guild: GuildId, user: UserId, amount: u64) -> Option<PayoutStatus> {
        if amount == 0 {
            return None;
        }
        let credited = tokio::time::timeout(self.payout_timeout, self.economy.credit(guild, user, amount))
            .await
            .unwrap_or(Err(GatewayError::TimedOut));
        Some(match credited {
            Ok(()) => PayoutStatus::Paid { amount },
            Err(err) => {
                tracing::warn!(%guild, %user, amount, error = %err, "boss reward payout failed");
                PayoutStatus::Failed {
                    amount,
                    reason: err.to_string(),
                }
            }
        })
    }

    pub async fn session(&self, guild: GuildId, user: UserId) -> Result<Option<CombatSession>> {
        self.registry.get(SessionKey::new(guild, user)).await
    }

    pub async fn bind_message(&self, guild: GuildId, user: UserId, message: MessageId) -> Result<()> {
        self.registry
            .bind_message(SessionKey::new(guild, user), message)
            .await
    }

    pub async fn can_start(&self, guild: GuildId) -> Result<bool> {
        self.registry.can_start(guild).await
    }
}
