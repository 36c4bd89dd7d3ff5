//! Skills usable by characters and bosses.

use crate::combat::{EffectTag, ElementalType};
use crate::config::GameConfig;
use crate::validation::{self, ValidationError};

/// Resource a common skill consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ResourceKind {
    #[default]
    Sp,
    Hp,
}

/// Guild-wide skill that characters equip by name.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommonSkill {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, alias = "type"))]
    pub element: ElementalType,
    #[cfg_attr(feature = "serde", serde(default, alias = "spCost"))]
    pub cost: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource: ResourceKind,
    /// Fixed damage; 0 for pure effect skills. Also the amount healed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect: Option<EffectTag>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,
}

impl CommonSkill {
    pub fn new(name: impl Into<String>, element: ElementalType) -> Self {
        Self {
            name: name.into(),
            element,
            cost: 0,
            resource: ResourceKind::Sp,
            damage: 0,
            effect: None,
            duration: GameConfig::DEFAULT_EFFECT_DURATION,
            cooldown: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name(&self.name)?;
        validation::at_most("cost", self.cost, GameConfig::MAX_STAT)?;
        validation::at_most("damage", self.damage, GameConfig::MAX_STAT)?;
        validation::at_most("duration", self.duration, GameConfig::MAX_SKILL_TURNS)?;
        validation::at_most("cooldown", self.cooldown, GameConfig::MAX_SKILL_TURNS)?;
        Ok(())
    }
}

/// Skill owned by a single boss.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BossSkill {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, alias = "type"))]
    pub element: ElementalType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect: Option<EffectTag>,
    #[cfg_attr(feature = "serde", serde(default = "default_duration"))]
    pub duration: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,
}

#[cfg(feature = "serde")]
fn default_duration() -> u32 {
    GameConfig::DEFAULT_EFFECT_DURATION
}

impl BossSkill {
    pub fn new(name: impl Into<String>, element: ElementalType, damage: u32) -> Self {
        Self {
            name: name.into(),
            element,
            damage,
            effect: None,
            duration: GameConfig::DEFAULT_EFFECT_DURATION,
            cooldown: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name(&self.name)?;
        validation::at_most("damage", self.damage, GameConfig::MAX_STAT)?;
        validation::at_most("duration", self.duration, GameConfig::MAX_SKILL_TURNS)?;
        validation::at_most("cooldown", self.cooldown, GameConfig::MAX_SKILL_TURNS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_enforced() {
        let mut skill = CommonSkill::new("Flare", ElementalType::Fire);
        assert!(skill.validate().is_ok());
        skill.cooldown = 11;
        assert!(matches!(
            skill.validate(),
            Err(ValidationError::TooLarge { field: "cooldown", .. })
        ));
    }

    #[test]
    fn resource_parses() {
        assert_eq!("HP".parse::<ResourceKind>().ok(), Some(ResourceKind::Hp));
    }
}
