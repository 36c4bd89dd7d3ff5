//! Stat blocks and elemental affinities.

use std::collections::{BTreeMap, BTreeSet};

use crate::combat::ElementalType;
use crate::validation::{self, ValidationError};

/// Base stats of a combatant. `hp` and `sp` are maxima.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spd: u32,
    pub sp: u32,
}

/// Stats used when a character item has no combat profile configured.
pub const DEFAULT_COMBAT_STATS: CombatStats = CombatStats {
    hp: 500,
    atk: 100,
    def: 50,
    spd: 50,
    sp: 100,
};

impl Default for CombatStats {
    fn default() -> Self {
        DEFAULT_COMBAT_STATS
    }
}

/// Stat selector for admin edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum StatKind {
    Hp,
    Atk,
    Def,
    Spd,
    Sp,
}

impl CombatStats {
    pub const fn new(hp: u32, atk: u32, def: u32, spd: u32, sp: u32) -> Self {
        Self {
            hp,
            atk,
            def,
            spd,
            sp,
        }
    }

    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Hp => self.hp,
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Spd => self.spd,
            StatKind::Sp => self.sp,
        }
    }

    /// Sets one stat after range validation.
    pub fn set(&mut self, kind: StatKind, value: u32) -> Result<(), ValidationError> {
        let value = validation::stat(kind, value)?;
        match kind {
            StatKind::Hp => self.hp = value,
            StatKind::Atk => self.atk = value,
            StatKind::Def => self.def = value,
            StatKind::Spd => self.spd = value,
            StatKind::Sp => self.sp = value,
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for kind in [
            StatKind::Hp,
            StatKind::Atk,
            StatKind::Def,
            StatKind::Spd,
            StatKind::Sp,
        ] {
            validation::stat(kind, self.get(kind))?;
        }
        Ok(())
    }
}

/// How a defender reacts to elemental types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affinities {
    #[cfg_attr(feature = "serde", serde(default))]
    pub weaknesses: BTreeSet<ElementalType>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resistances: BTreeSet<ElementalType>,
    /// Type → percentage of base damage sent back to the attacker.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reflects: BTreeMap<ElementalType, u8>,
}

impl Affinities {
    pub fn with_weakness(mut self, element: ElementalType) -> Self {
        self.weaknesses.insert(element);
        self
    }

    pub fn with_resistance(mut self, element: ElementalType) -> Self {
        self.resistances.insert(element);
        self
    }

    pub fn with_reflect(mut self, element: ElementalType, percent: u8) -> Self {
        self.reflects.insert(element, percent);
        self
    }

    pub fn reflect_percent(&self, element: ElementalType) -> Option<u8> {
        self.reflects.get(&element).copied()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for percent in self.reflects.values() {
            validation::reflect_percent(u32::from(*percent))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_within_limits() {
        assert!(DEFAULT_COMBAT_STATS.validate().is_ok());
    }

    #[test]
    fn set_rejects_out_of_range_without_mutation() {
        let mut stats = CombatStats::default();
        assert!(stats.set(StatKind::Atk, 1001).is_err());
        assert_eq!(stats.atk, 100);
        stats.set(StatKind::Atk, 250).unwrap();
        assert_eq!(stats.get(StatKind::Atk), 250);
    }

    #[test]
    fn stat_kind_parses() {
        assert_eq!("ATK".parse::<StatKind>().ok(), Some(StatKind::Atk));
        assert_eq!(StatKind::Sp.to_string(), "sp");
    }
}
