//! Temporary stat modifiers and skill cooldowns.
//!
//! Formula: `up → floor(stat × 1.3)`, `down → floor(stat × 0.7)`, buff first.
//! The multiplier is flat: a buff with five turns left scales the same as one
//! with a single turn left.

use std::collections::BTreeMap;

use crate::combat::{CombatStats, Direction, ModifiedStat};

const UP_NUMERATOR: u32 = 13;
const DOWN_NUMERATOR: u32 = 7;
const DENOMINATOR: u32 = 10;

/// Active buffs and debuffs, each mapped to its remaining turns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers {
    pub buffs: BTreeMap<ModifiedStat, u32>,
    pub debuffs: BTreeMap<ModifiedStat, u32>,
}

impl Modifiers {
    /// Applies (or refreshes) a modifier for `turns` turns.
    pub fn apply(&mut self, stat: ModifiedStat, direction: Direction, turns: u32) {
        if turns == 0 {
            return;
        }
        let table = match direction {
            Direction::Up => &mut self.buffs,
            Direction::Down => &mut self.debuffs,
        };
        table.insert(stat, turns);
    }

    pub fn is_active(&self, stat: ModifiedStat, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.buffs.contains_key(&stat),
            Direction::Down => self.debuffs.contains_key(&stat),
        }
    }

    /// Decrements every remaining duration and drops the expired ones.
    pub fn tick(&mut self) {
        tick_table(&mut self.buffs);
        tick_table(&mut self.debuffs);
    }

    pub fn snapshot(&self, base: &CombatStats) -> CombatStats {
        apply_modifiers(base, &self.buffs, &self.debuffs)
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty() && self.debuffs.is_empty()
    }
}

/// Effective stats after buffs and debuffs. Never mutates `base`.
pub fn apply_modifiers(
    base: &CombatStats,
    buffs: &BTreeMap<ModifiedStat, u32>,
    debuffs: &BTreeMap<ModifiedStat, u32>,
) -> CombatStats {
    let scale = |stat: ModifiedStat, value: u32| {
        let mut value = value;
        if buffs.contains_key(&stat) {
            value = value * UP_NUMERATOR / DENOMINATOR;
        }
        if debuffs.contains_key(&stat) {
            value = value * DOWN_NUMERATOR / DENOMINATOR;
        }
        value
    };

    CombatStats {
        atk: scale(ModifiedStat::Atk, base.atk),
        def: scale(ModifiedStat::Def, base.def),
        spd: scale(ModifiedStat::Spd, base.spd),
        ..*base
    }
}

/// Remaining cooldown turns keyed by skill name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Cooldowns {
    remaining: BTreeMap<String, u32>,
}

impl Cooldowns {
    pub fn start(&mut self, skill: &str, turns: u32) {
        if turns > 0 {
            self.remaining.insert(skill.to_string(), turns);
        }
    }

    pub fn is_ready(&self, skill: &str) -> bool {
        !self.remaining.contains_key(skill)
    }

    pub fn remaining(&self, skill: &str) -> u32 {
        self.remaining.get(skill).copied().unwrap_or(0)
    }

    pub fn tick(&mut self) {
        tick_table(&mut self.remaining);
    }
}

fn tick_table<K: Ord>(table: &mut BTreeMap<K, u32>) {
    table.retain(|_, turns| {
        *turns = turns.saturating_sub(1);
        *turns > 0
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(atk: u32, def: u32, spd: u32) -> CombatStats {
        CombatStats::new(100, atk, def, spd, 50)
    }

    #[test]
    fn atk_up_scales_by_thirty_percent_regardless_of_turns() {
        let buffs = BTreeMap::from([(ModifiedStat::Atk, 2)]);
        let effective = apply_modifiers(&stats(100, 10, 10), &buffs, &BTreeMap::new());
        assert_eq!(effective.atk, 130);

        let long = BTreeMap::from([(ModifiedStat::Atk, 9)]);
        let effective = apply_modifiers(&stats(100, 10, 10), &long, &BTreeMap::new());
        assert_eq!(effective.atk, 130);
    }

    #[test]
    fn debuff_floors() {
        let debuffs = BTreeMap::from([(ModifiedStat::Def, 1)]);
        let effective = apply_modifiers(&stats(10, 55, 10), &BTreeMap::new(), &debuffs);
        assert_eq!(effective.def, 38);
        assert_eq!(effective.atk, 10);
    }

    #[test]
    fn buff_then_debuff_when_both_active() {
        let buffs = BTreeMap::from([(ModifiedStat::Spd, 1)]);
        let debuffs = BTreeMap::from([(ModifiedStat::Spd, 1)]);
        let effective = apply_modifiers(&stats(1, 1, 100), &buffs, &debuffs);
        // floor(floor(100 * 1.3) * 0.7) = floor(130 * 0.7) = 91
        assert_eq!(effective.spd, 91);
    }

    #[test]
    fn snapshot_leaves_base_untouched() {
        let mut modifiers = Modifiers::default();
        modifiers.apply(ModifiedStat::Atk, Direction::Up, 3);
        let base = stats(100, 10, 10);
        let effective = modifiers.snapshot(&base);
        assert_eq!(effective.atk, 130);
        assert_eq!(base.atk, 100);
        assert_eq!(effective.hp, base.hp);
    }

    #[test]
    fn tick_expires_entries() {
        let mut modifiers = Modifiers::default();
        modifiers.apply(ModifiedStat::Def, Direction::Up, 1);
        modifiers.apply(ModifiedStat::Atk, Direction::Down, 2);

        modifiers.tick();
        assert!(!modifiers.is_active(ModifiedStat::Def, Direction::Up));
        assert!(modifiers.is_active(ModifiedStat::Atk, Direction::Down));

        modifiers.tick();
        assert!(modifiers.is_empty());
    }

    #[test]
    fn cooldowns_count_down() {
        let mut cooldowns = Cooldowns::default();
        cooldowns.start("Flare", 2);
        assert!(!cooldowns.is_ready("Flare"));
        cooldowns.tick();
        assert_eq!(cooldowns.remaining("Flare"), 1);
        cooldowns.tick();
        assert!(cooldowns.is_ready("Flare"));

        cooldowns.start("Guard", 0);
        assert!(cooldowns.is_ready("Guard"));
    }
}
