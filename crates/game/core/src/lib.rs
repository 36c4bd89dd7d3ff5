//! Pure game rules for the gacha bot.
//!
//! `gacha-core` defines the canonical rules (weighted draws, pity, rewards,
//! combat) and exposes pure APIs that the runtime and content loaders share.
//! Nothing here performs I/O or reads a clock; randomness is injected through
//! [`RandomSource`] so every rule can be replayed from a seed.
//!
//! - [`gacha`] covers the draw engine, collections, tokens and banner odds
//! - [`combat`] covers damage, modifiers, skills and the battle state machine
pub mod combat;
pub mod config;
pub mod error;
pub mod gacha;
pub mod ids;
pub mod random;
pub mod validation;

pub use combat::{
    ActionError, ActionRecord, Affinities, Battle, BattleStatus, Boss, BossFighter, BossSkill,
    CombatCharacter, CombatProfile, CombatStats, CommonSkill, Cooldowns, DEFAULT_COMBAT_STATS,
    DamageOptions, DamageOutcome, Difficulty, Direction, EffectTag, ElementalType, Fighter,
    Modifiers, ModifiedStat, Move, PlayerAction, ResourceKind, StatKind, TurnReport,
};
pub use config::GameConfig;
pub use error::{ErrorSeverity, GameError};
pub use gacha::{
    Banner, BannerEntry, Claim, Collection, DrawEngine, DrawGroup, DrawOutcome, Exchange,
    ExchangeError, InsufficientCopies, Named, ObjectKind, PityState, Rarity, RarityShare,
    RewardItem, TenDraw, TokenWallet, Weighted, find_by_name, position_by_name,
};
pub use ids::{GuildId, MessageId, UserId};
pub use random::{PcgRng, RandomSource};
pub use validation::ValidationError;
