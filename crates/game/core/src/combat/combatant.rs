//! Catalog combat profiles and their per-battle instances.

use arrayvec::ArrayVec;

use crate::combat::{
    Affinities, BossSkill, CombatStats, CommonSkill, Cooldowns, DEFAULT_COMBAT_STATS,
    ElementalType, Modifiers,
};
use crate::config::GameConfig;
use crate::gacha::{ObjectKind, RewardItem};
use crate::validation::{self, ValidationError};

/// Optional combat block stored on a character reward item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatProfile {
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: CombatStats,
    #[cfg_attr(feature = "serde", serde(default, alias = "type"))]
    pub element: ElementalType,
    /// Names of equipped common skills, in use order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub skills: ArrayVec<String, { GameConfig::MAX_EQUIPPED_SKILLS }>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub affinities: Affinities,
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self {
            stats: DEFAULT_COMBAT_STATS,
            element: ElementalType::Neutral,
            skills: ArrayVec::new(),
            affinities: Affinities::default(),
        }
    }
}

impl CombatProfile {
    /// Equips a skill by name; re-equipping is a no-op.
    pub fn equip(&mut self, skill: &str) -> Result<(), ValidationError> {
        if self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            return Ok(());
        }
        self.skills
            .try_push(skill.to_string())
            .map_err(|_| ValidationError::TooManySkills {
                limit: GameConfig::MAX_EQUIPPED_SKILLS,
            })
    }

    pub fn unequip(&mut self, skill: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| !s.eq_ignore_ascii_case(skill));
        self.skills.len() != before
    }
}

/// A reward item projected into combat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatCharacter {
    pub name: String,
    pub profile: CombatProfile,
}

impl CombatCharacter {
    /// Projects a character item. Items without a combat block use
    /// [`DEFAULT_COMBAT_STATS`]; person and object items cannot fight.
    pub fn from_item(item: &RewardItem) -> Result<Self, ValidationError> {
        if item.kind != ObjectKind::Character {
            return Err(ValidationError::NotACharacter(item.name.clone()));
        }
        Ok(Self {
            name: item.name.clone(),
            profile: item.combat.clone().unwrap_or_default(),
        })
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Extreme,
}

/// A configured boss.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boss {
    pub name: String,
    pub stats: CombatStats,
    #[cfg_attr(feature = "serde", serde(default, alias = "type"))]
    pub element: ElementalType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub skills: ArrayVec<BossSkill, { GameConfig::MAX_BOSS_SKILLS }>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub affinities: Affinities,
    /// Currency paid to the initiating user on victory.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reward: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub difficulty: Difficulty,
}

impl Boss {
    pub fn new(name: impl Into<String>, stats: CombatStats, element: ElementalType) -> Self {
        Self {
            name: name.into(),
            stats,
            element,
            skills: ArrayVec::new(),
            affinities: Affinities::default(),
            reward: 0,
            difficulty: Difficulty::Normal,
        }
    }

    pub fn add_skill(&mut self, skill: BossSkill) -> Result<(), ValidationError> {
        skill.validate()?;
        if self.skills.iter().any(|s| s.name.eq_ignore_ascii_case(&skill.name)) {
            return Err(ValidationError::DuplicateName {
                kind: "boss skill",
                name: skill.name,
            });
        }
        self.skills
            .try_push(skill)
            .map_err(|_| ValidationError::TooManySkills {
                limit: GameConfig::MAX_BOSS_SKILLS,
            })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name(&self.name)?;
        self.stats.validate()?;
        self.affinities.validate()?;
        self.skills.iter().try_for_each(BossSkill::validate)
    }

    pub fn remove_skill(&mut self, name: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| !s.name.eq_ignore_ascii_case(name));
        self.skills.len() != before
    }
}

// ============================================================================
// Per-battle instances
// ============================================================================

/// A character inside a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fighter {
    pub name: String,
    pub stats: CombatStats,
    pub element: ElementalType,
    pub affinities: Affinities,
    /// Equipped skills resolved against the guild's common skills.
    pub skills: Vec<CommonSkill>,
    pub hp: u32,
    pub sp: u32,
    pub modifiers: Modifiers,
    pub cooldowns: Cooldowns,
}

impl Fighter {
    /// Instantiates a character at full HP and SP. Equipped names that do not
    /// resolve to a common skill are skipped.
    pub fn new(character: CombatCharacter, catalog: &[CommonSkill]) -> Self {
        let profile = character.profile;
        let skills = profile
            .skills
            .iter()
            .filter_map(|name| {
                catalog
                    .iter()
                    .find(|skill| skill.name.eq_ignore_ascii_case(name))
                    .cloned()
            })
            .collect();

        Self {
            name: character.name,
            stats: profile.stats,
            element: profile.element,
            affinities: profile.affinities,
            skills,
            hp: profile.stats.hp,
            sp: profile.stats.sp,
            modifiers: Modifiers::default(),
            cooldowns: Cooldowns::default(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp == 0
    }

    pub fn effective_stats(&self) -> CombatStats {
        self.modifiers.snapshot(&self.stats)
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.stats.hp);
        self.hp - before
    }

    pub fn regenerate_sp(&mut self, amount: u32) -> u32 {
        let before = self.sp;
        self.sp = self.sp.saturating_add(amount).min(self.stats.sp);
        self.sp - before
    }
}

/// A boss inside a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BossFighter {
    pub profile: Boss,
    pub hp: u32,
    pub modifiers: Modifiers,
    pub cooldowns: Cooldowns,
}

impl BossFighter {
    pub fn new(profile: Boss) -> Self {
        Self {
            hp: profile.stats.hp,
            profile,
            modifiers: Modifiers::default(),
            cooldowns: Cooldowns::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn is_down(&self) -> bool {
        self.hp == 0
    }

    pub fn effective_stats(&self) -> CombatStats {
        self.modifiers.snapshot(&self.profile.stats)
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.profile.stats.hp);
        self.hp - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gacha::Rarity;

    #[test]
    fn unconfigured_character_uses_default_stats() {
        let item = RewardItem::new("Aria", 1, Rarity::SR);
        let character = CombatCharacter::from_item(&item).unwrap();
        assert_eq!(character.profile.stats, DEFAULT_COMBAT_STATS);
    }

    #[test]
    fn inventory_items_cannot_fight() {
        let item = RewardItem::new("Coin", 1, Rarity::R).kind(ObjectKind::Object);
        assert_eq!(
            CombatCharacter::from_item(&item),
            Err(ValidationError::NotACharacter("Coin".to_string()))
        );
    }

    #[test]
    fn equip_caps_at_three() {
        let mut profile = CombatProfile::default();
        for name in ["a", "b", "c"] {
            profile.equip(name).unwrap();
        }
        profile.equip("A").unwrap();
        assert_eq!(profile.skills.len(), 3);
        assert!(matches!(
            profile.equip("d"),
            Err(ValidationError::TooManySkills { limit: 3 })
        ));
        assert!(profile.unequip("b"));
        assert!(profile.equip("d").is_ok());
    }

    #[test]
    fn fighter_resolves_known_skills_only() {
        let mut profile = CombatProfile::default();
        profile.equip("Flare").unwrap();
        profile.equip("Missing").unwrap();
        let character = CombatCharacter {
            name: "Aria".to_string(),
            profile,
        };
        let catalog = vec![CommonSkill::new("flare", ElementalType::Fire)];
        let fighter = Fighter::new(character, &catalog);
        assert_eq!(fighter.skills.len(), 1);
        assert_eq!(fighter.hp, DEFAULT_COMBAT_STATS.hp);
        assert_eq!(fighter.sp, DEFAULT_COMBAT_STATS.sp);
    }

    #[test]
    fn boss_skill_limit() {
        let mut boss = Boss::new("Golem", DEFAULT_COMBAT_STATS, ElementalType::Earth);
        for name in ["Slam", "Quake", "Roar"] {
            boss.add_skill(BossSkill::new(name, ElementalType::Earth, 10)).unwrap();
        }
        assert!(boss.add_skill(BossSkill::new("Crush", ElementalType::Earth, 10)).is_err());
        assert!(matches!(
            boss.add_skill(BossSkill::new("slam", ElementalType::Earth, 1)),
            Err(ValidationError::DuplicateName { .. })
        ));
    }
}
