//! Event payloads.

use gacha_core::{BattleStatus, GuildId, Rarity, UserId};
use serde::{Deserialize, Serialize};

/// One item drawn by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawEvent {
    pub guild: GuildId,
    pub user: UserId,
    pub item: String,
    pub rarity: Rarity,
    /// Pity restricted the pool to SSR.
    pub forced: bool,
}

/// How a battle left the registry.
///
/// `Timeout` and `Evicted` are distinct from `Forfeit` so idle players are
/// never counted as having given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Forfeit,
    Timeout,
    Evicted,
}

impl CombatOutcome {
    /// Terminal battle status as an outcome; `None` while still active.
    pub fn from_status(status: BattleStatus) -> Option<Self> {
        match status {
            BattleStatus::Active => None,
            BattleStatus::Victory => Some(Self::Victory),
            BattleStatus::Defeat => Some(Self::Defeat),
            BattleStatus::Forfeit => Some(Self::Forfeit),
            BattleStatus::Timeout => Some(Self::Timeout),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    Started {
        guild: GuildId,
        user: UserId,
        session: u64,
        boss: String,
        party: Vec<String>,
    },
    TurnResolved {
        guild: GuildId,
        user: UserId,
        session: u64,
        turn: u32,
        boss_hp: u32,
    },
    Ended {
        guild: GuildId,
        user: UserId,
        session: u64,
        outcome: CombatOutcome,
        turns: u32,
    },
}
