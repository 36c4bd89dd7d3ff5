//! Skill effect tags.
//!
//! Catalog records store effects as `<stat>_<direction>` strings (`atk_up`,
//! `def_down`, ...) or `heal`. They are decoded once into [`EffectTag`] when a
//! record is loaded, so the battle loop never parses strings.

use core::fmt;
use core::str::FromStr;

use crate::validation::ValidationError;

/// Stat a buff or debuff scales.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModifiedStat {
    Atk,
    Def,
    Spd,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Direction {
    /// Lands on the user of the skill.
    Up,
    /// Lands on the opponent.
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectTag {
    Modify {
        stat: ModifiedStat,
        direction: Direction,
    },
    Heal,
}

impl EffectTag {
    pub const fn buff(stat: ModifiedStat) -> Self {
        Self::Modify {
            stat,
            direction: Direction::Up,
        }
    }

    pub const fn debuff(stat: ModifiedStat) -> Self {
        Self::Modify {
            stat,
            direction: Direction::Down,
        }
    }
}

impl FromStr for EffectTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        if tag == "heal" {
            return Ok(Self::Heal);
        }
        let unknown = || ValidationError::UnknownEffect(s.to_string());
        let (stat, direction) = tag.split_once('_').ok_or_else(unknown)?;
        Ok(Self::Modify {
            stat: stat.parse().map_err(|_| unknown())?,
            direction: direction.parse().map_err(|_| unknown())?,
        })
    }
}

impl fmt::Display for EffectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modify { stat, direction } => write!(f, "{stat}_{direction}"),
            Self::Heal => f.write_str("heal"),
        }
    }
}

// Persisted as the tag string, so records stay readable and editable by hand.
#[cfg(feature = "serde")]
impl serde::Serialize for EffectTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EffectTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stat_tags() {
        assert_eq!("atk_up".parse(), Ok(EffectTag::buff(ModifiedStat::Atk)));
        assert_eq!("DEF_down".parse(), Ok(EffectTag::debuff(ModifiedStat::Def)));
        assert_eq!(" heal ".parse(), Ok(EffectTag::Heal));
    }

    #[test]
    fn rejects_unknown_tags() {
        assert!("hp_up".parse::<EffectTag>().is_err());
        assert!("atk_sideways".parse::<EffectTag>().is_err());
        assert!("poison".parse::<EffectTag>().is_err());
    }

    #[test]
    fn display_matches_storage_format() {
        assert_eq!(EffectTag::debuff(ModifiedStat::Spd).to_string(), "spd_down");
        assert_eq!(EffectTag::Heal.to_string(), "heal");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&EffectTag::buff(ModifiedStat::Atk)).unwrap();
        assert_eq!(json, "\"atk_up\"");
        let back: EffectTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EffectTag::buff(ModifiedStat::Atk));
    }
}
