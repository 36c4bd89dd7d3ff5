//! Combat resolution system.
//!
//! Pure functions and a single state machine for boss battles. All
//! randomness (boss skill choice) is injected; damage math is deterministic.
//!
//! # Architecture
//!
//! - **Pure Functions**: [`resolve`] and [`apply_modifiers`] are side-effect free
//! - **Profiles vs Instances**: catalog records ([`CombatCharacter`], [`Boss`])
//!   are projected into per-battle instances ([`Fighter`], [`BossFighter`])
//! - **State Machine**: [`Battle`] owns one exchange protocol per turn
//!
//! # Core Functions
//!
//! - `resolve`: damage with weakness, resistance and reflect
//! - `apply_modifiers`: buff/debuff snapshot of a stat block
//! - `apply_damage`: HP reduction (clamped to 0)

pub mod battle;
pub mod combatant;
pub mod damage;
pub mod effect;
pub mod element;
pub mod modifiers;
pub mod skill;
pub mod stats;

pub use battle::{
    ActionError, ActionRecord, Battle, BattleStatus, Move, PlayerAction, TurnReport,
};
pub use combatant::{Boss, BossFighter, CombatCharacter, CombatProfile, Difficulty, Fighter};
pub use damage::{Attacker, DamageOptions, DamageOutcome, Defender, apply_damage, resolve};
pub use effect::{Direction, EffectTag, ModifiedStat};
pub use element::ElementalType;
pub use modifiers::{Cooldowns, Modifiers, apply_modifiers};
pub use skill::{BossSkill, CommonSkill, ResourceKind};
pub use stats::{Affinities, CombatStats, DEFAULT_COMBAT_STATS, StatKind};
