//! Damage calculation and application.

use crate::combat::{Affinities, CombatStats, ElementalType};

/// The attacking side of an exchange.
#[derive(Clone, Copy, Debug)]
pub struct Attacker<'a> {
    pub stats: &'a CombatStats,
    pub element: ElementalType,
}

/// The defending side of an exchange.
#[derive(Clone, Copy, Debug)]
pub struct Defender<'a> {
    pub stats: &'a CombatStats,
    pub affinities: &'a Affinities,
}

/// Overrides supplied by skill-based attacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageOptions {
    /// Fixed damage that replaces the ATK/DEF formula.
    pub fixed_damage: Option<u32>,
    /// Elemental type that replaces the attacker's own.
    pub skill_element: Option<ElementalType>,
}

impl DamageOptions {
    pub fn skill(damage: u32, element: ElementalType) -> Self {
        Self {
            fixed_damage: Some(damage),
            skill_element: Some(element),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Damage to the defender.
    pub damage: u32,
    pub reflected: bool,
    /// Damage to the attacker when reflected.
    pub reflected_damage: u32,
}

/// Resolve one hit.
///
/// # Formula
///
/// ```text
/// base    = fixed_damage or max(1, atk - def)
/// element = skill_element or attacker.element
///
/// if element in reflects:     damage = 0, reflected = floor(base * pct / 100)
/// elif element in weaknesses: damage = floor(base * 1.5)
/// elif element in resistances: damage = floor(base * 0.5)
/// else:                       damage = base
/// ```
///
/// Reflect is its own branch and never combines with the multipliers.
/// Deterministic: no randomness is involved.
pub fn resolve(attacker: Attacker<'_>, defender: Defender<'_>, opts: DamageOptions) -> DamageOutcome {
    let base = opts
        .fixed_damage
        .unwrap_or_else(|| attacker.stats.atk.saturating_sub(defender.stats.def).max(1));
    let element = opts.skill_element.unwrap_or(attacker.element);
    let affinities = defender.affinities;

    if let Some(percent) = affinities.reflect_percent(element) {
        let reflected_damage = (u64::from(base) * u64::from(percent) / 100) as u32;
        return DamageOutcome {
            damage: 0,
            reflected: true,
            reflected_damage,
        };
    }

    let damage = if affinities.weaknesses.contains(&element) {
        base.saturating_mul(3) / 2
    } else if affinities.resistances.contains(&element) {
        base / 2
    } else {
        base
    };

    DamageOutcome {
        damage,
        reflected: false,
        reflected_damage: 0,
    }
}

/// Apply damage to current HP, clamped to 0.
pub fn apply_damage(current_hp: u32, damage: u32) -> u32 {
    current_hp.saturating_sub(damage)
}
