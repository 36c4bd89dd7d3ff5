//! Boss battle state machine.
//!
//! One [`Battle`] is one party of characters against one boss. Characters act
//! one at a time in party order; the boss answers every non-terminal player
//! action. The battle does not own a clock: timeouts are driven from outside
//! through [`Battle::expire`].
//!
//! # Turn protocol
//!
//! ```text
//! 1. Forfeit                → FORFEIT
//! 2-4. Attack | Skill | Defend by the acting character
//! 5. boss HP = 0            → VICTORY
//! 6. boss counter-action (skipped if the character fell to a reflect)
//!    boss HP = 0            → VICTORY (reflected damage)
//! 7. character HP = 0       → next character, or DEFEAT if none remain
//! 8. tick buffs, debuffs and cooldowns of the acting character and the boss
//! 9. turn % 3 == 0, turn > 0 → +10 SP for the character now acting
//! 10. turn += 1
//! ```
//!
//! A rejected action (no skill ready, not enough SP/HP) leaves the battle
//! untouched and consumes no turn.

use crate::combat::damage::{self, Attacker, DamageOptions, Defender};
use crate::combat::{
    BossFighter, CombatStats, Direction, EffectTag, ElementalType, Fighter, ModifiedStat,
    ResourceKind,
};
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::random::RandomSource;
use crate::validation::ValidationError;

/// Action chosen by the player for the acting character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum PlayerAction {
    Attack,
    #[strum(to_string = "skill")]
    UseSkill,
    Defend,
    Forfeit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BattleStatus {
    Active,
    Victory,
    Defeat,
    Forfeit,
    Timeout,
}

impl BattleStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, BattleStatus::Active)
    }
}

/// Action rejected before any state changed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("the battle is already over ({0})")]
    BattleOver(BattleStatus),

    #[error("{character} has no skills equipped")]
    NoSkillsEquipped { character: String },

    #[error("every skill of {character} is on cooldown")]
    AllSkillsOnCooldown { character: String },

    #[error("{skill} needs {required} {resource}, only {available} left")]
    InsufficientResource {
        skill: String,
        resource: ResourceKind,
        required: u32,
        available: u32,
    },
}

impl GameError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Precondition
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BattleOver(_) => "BATTLE_OVER",
            Self::NoSkillsEquipped { .. } => "NO_SKILLS_EQUIPPED",
            Self::AllSkillsOnCooldown { .. } => "ALL_SKILLS_ON_COOLDOWN",
            Self::InsufficientResource { .. } => "INSUFFICIENT_RESOURCE",
        }
    }
}

/// What a combatant did during a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Move {
    Attack,
    Skill(String),
    Defend,
    Forfeit,
}

/// One side's half of a turn, for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    pub actor: String,
    pub action: Move,
    pub element: ElementalType,
    /// Damage dealt to the opponent.
    pub damage: u32,
    pub reflected: bool,
    /// Damage the actor took from a reflect.
    pub reflected_damage: u32,
    pub effect: Option<EffectTag>,
    pub healed: u32,
}

impl ActionRecord {
    fn new(actor: &str, action: Move, element: ElementalType) -> Self {
        Self {
            actor: actor.to_string(),
            action,
            element,
            damage: 0,
            reflected: false,
            reflected_damage: 0,
            effect: None,
            healed: 0,
        }
    }
}

/// Result of one submitted action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// Turn index the action was taken on.
    pub turn: u32,
    pub player: ActionRecord,
    pub boss: Option<ActionRecord>,
    /// Character that fell this turn.
    pub knocked_out: Option<String>,
    /// Character acting next, when it changed.
    pub next_character: Option<String>,
    pub sp_regenerated: u32,
    pub boss_hp: u32,
    pub status: BattleStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Battle {
    boss: BossFighter,
    party: Vec<Fighter>,
    current: usize,
    turn: u32,
    status: BattleStatus,
    boss_skill_bias_percent: u8,
}

impl Battle {
    pub fn new(
        boss: BossFighter,
        party: Vec<Fighter>,
        config: &GameConfig,
    ) -> Result<Self, ValidationError> {
        if party.is_empty() {
            return Err(ValidationError::EmptyParty);
        }
        Ok(Self {
            boss,
            party,
            current: 0,
            turn: 0,
            status: BattleStatus::Active,
            boss_skill_bias_percent: config.boss_skill_bias_percent.min(100),
        })
    }

    pub fn boss(&self) -> &BossFighter {
        &self.boss
    }

    pub fn party(&self) -> &[Fighter] {
        &self.party
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_character(&self) -> &Fighter {
        &self.party[self.current]
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn status(&self) -> BattleStatus {
        self.status
    }

    /// Ends an active battle because no action arrived in time.
    pub fn expire(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = BattleStatus::Timeout;
        true
    }

    /// Runs one full exchange for the acting character.
    pub fn submit<R>(&mut self, action: PlayerAction, rng: &mut R) -> Result<TurnReport, ActionError>
    where
        R: RandomSource + ?Sized,
    {
        if self.status.is_terminal() {
            return Err(ActionError::BattleOver(self.status));
        }

        let acting = self.current;
        let turn = self.turn;

        let player = match action {
            PlayerAction::Forfeit => {
                self.status = BattleStatus::Forfeit;
                let fighter = &self.party[acting];
                let record = ActionRecord::new(&fighter.name, Move::Forfeit, fighter.element);
                return Ok(self.report(turn, record, None));
            }
            PlayerAction::Attack => self.player_attack(acting),
            PlayerAction::UseSkill => self.player_skill(acting)?,
            PlayerAction::Defend => self.player_defend(acting),
        };

        if self.boss.is_down() {
            self.status = BattleStatus::Victory;
            return Ok(self.report(turn, player, None));
        }

        let boss = if self.party[acting].is_down() {
            None
        } else {
            Some(self.boss_action(acting, rng))
        };

        if self.boss.is_down() {
            self.status = BattleStatus::Victory;
            return Ok(self.report(turn, player, boss));
        }

        let mut knocked_out = None;
        let mut next_character = None;
        if self.party[acting].is_down() {
            knocked_out = Some(self.party[acting].name.clone());
            match self.next_standing(acting) {
                Some(next) => {
                    self.current = next;
                    next_character = Some(self.party[next].name.clone());
                }
                None => {
                    self.status = BattleStatus::Defeat;
                    let mut report = self.report(turn, player, boss);
                    report.knocked_out = knocked_out;
                    return Ok(report);
                }
            }
        }

        let fighter = &mut self.party[acting];
        fighter.modifiers.tick();
        fighter.cooldowns.tick();
        self.boss.modifiers.tick();
        self.boss.cooldowns.tick();

        let mut sp_regenerated = 0;
        if turn > 0 && turn % GameConfig::SP_REGEN_INTERVAL == 0 {
            sp_regenerated = self.party[self.current].regenerate_sp(GameConfig::SP_REGEN_AMOUNT);
        }

        self.turn += 1;

        let mut report = self.report(turn, player, boss);
        report.knocked_out = knocked_out;
        report.next_character = next_character;
        report.sp_regenerated = sp_regenerated;
        Ok(report)
    }

    fn report(&self, turn: u32, player: ActionRecord, boss: Option<ActionRecord>) -> TurnReport {
        TurnReport {
            turn,
            player,
            boss,
            knocked_out: None,
            next_character: None,
            sp_regenerated: 0,
            boss_hp: self.boss.hp,
            status: self.status,
        }
    }

    fn next_standing(&self, after: usize) -> Option<usize> {
        (after + 1..self.party.len()).find(|&idx| !self.party[idx].is_down())
    }

    // ------------------------------------------------------------------------
    // Player side
    // ------------------------------------------------------------------------

    fn player_attack(&mut self, acting: usize) -> ActionRecord {
        let fighter = &mut self.party[acting];
        let mut record = ActionRecord::new(&fighter.name, Move::Attack, fighter.element);
        strike_boss(fighter, &mut self.boss, DamageOptions::default(), &mut record);
        record
    }

    fn player_skill(&mut self, acting: usize) -> Result<ActionRecord, ActionError> {
        let fighter = &mut self.party[acting];
        if fighter.skills.is_empty() {
            return Err(ActionError::NoSkillsEquipped {
                character: fighter.name.clone(),
            });
        }
        let skill = fighter
            .skills
            .iter()
            .find(|skill| fighter.cooldowns.is_ready(&skill.name))
            .cloned()
            .ok_or_else(|| ActionError::AllSkillsOnCooldown {
                character: fighter.name.clone(),
            })?;

        let pool = match skill.resource {
            ResourceKind::Hp => &mut fighter.hp,
            ResourceKind::Sp => &mut fighter.sp,
        };
        if *pool < skill.cost {
            return Err(ActionError::InsufficientResource {
                skill: skill.name.clone(),
                resource: skill.resource,
                required: skill.cost,
                available: *pool,
            });
        }
        *pool -= skill.cost;

        let mut record = ActionRecord::new(&fighter.name, Move::Skill(skill.name.clone()), skill.element);
        if skill.damage > 0 {
            let opts = DamageOptions::skill(skill.damage, skill.element);
            strike_boss(fighter, &mut self.boss, opts, &mut record);
        }

        if let Some(effect) = skill.effect {
            record.effect = Some(effect);
            match effect {
                EffectTag::Modify {
                    stat,
                    direction: Direction::Up,
                } => fighter.modifiers.apply(stat, Direction::Up, skill.duration),
                EffectTag::Modify {
                    stat,
                    direction: Direction::Down,
                } => self.boss.modifiers.apply(stat, Direction::Down, skill.duration),
                EffectTag::Heal => record.healed = fighter.heal(skill.damage),
            }
        }

        fighter.cooldowns.start(&skill.name, skill.cooldown);
        Ok(record)
    }

    fn player_defend(&mut self, acting: usize) -> ActionRecord {
        let fighter = &mut self.party[acting];
        fighter
            .modifiers
            .apply(ModifiedStat::Def, Direction::Up, GameConfig::DEFEND_DURATION);
        let mut record = ActionRecord::new(&fighter.name, Move::Defend, fighter.element);
        record.effect = Some(EffectTag::buff(ModifiedStat::Def));
        record
    }

    // ------------------------------------------------------------------------
    // Boss side
    // ------------------------------------------------------------------------

    fn boss_action<R>(&mut self, target: usize, rng: &mut R) -> ActionRecord
    where
        R: RandomSource + ?Sized,
    {
        let ready: Vec<usize> = self
            .boss
            .profile
            .skills
            .iter()
            .enumerate()
            .filter(|(_, skill)| self.boss.cooldowns.is_ready(&skill.name))
            .map(|(idx, _)| idx)
            .collect();

        let fighter = &mut self.party[target];
        let boss = &mut self.boss;

        if ready.is_empty() || !rng.chance(self.boss_skill_bias_percent) {
            let mut record = ActionRecord::new(boss.name(), Move::Attack, boss.profile.element);
            strike_fighter(boss, fighter, DamageOptions::default(), &mut record);
            return record;
        }

        let skill = boss.profile.skills[ready[rng.index(ready.len())]].clone();
        let mut record = ActionRecord::new(boss.name(), Move::Skill(skill.name.clone()), skill.element);
        if skill.damage > 0 {
            let opts = DamageOptions::skill(skill.damage, skill.element);
            strike_fighter(boss, fighter, opts, &mut record);
        }

        if let Some(effect) = skill.effect {
            record.effect = Some(effect);
            match effect {
                EffectTag::Modify {
                    stat,
                    direction: Direction::Up,
                } => boss.modifiers.apply(stat, Direction::Up, skill.duration),
                EffectTag::Modify {
                    stat,
                    direction: Direction::Down,
                } => fighter.modifiers.apply(stat, Direction::Down, skill.duration),
                EffectTag::Heal => record.healed = boss.heal(skill.damage),
            }
        }

        boss.cooldowns.start(&skill.name, skill.cooldown);
        record
    }
}

fn strike_boss(
    fighter: &mut Fighter,
    boss: &mut BossFighter,
    opts: DamageOptions,
    record: &mut ActionRecord,
) {
    let attacker_stats: CombatStats = fighter.effective_stats();
    let boss_stats = boss.effective_stats();
    let outcome = damage::resolve(
        Attacker {
            stats: &attacker_stats,
            element: fighter.element,
        },
        Defender {
            stats: &boss_stats,
            affinities: &boss.profile.affinities,
        },
        opts,
    );
    boss.hp = damage::apply_damage(boss.hp, outcome.damage);
    fighter.hp = damage::apply_damage(fighter.hp, outcome.reflected_damage);
    record.damage = outcome.damage;
    record.reflected = outcome.reflected;
    record.reflected_damage = outcome.reflected_damage;
}

fn strike_fighter(
    boss: &mut BossFighter,
    fighter: &mut Fighter,
    opts: DamageOptions,
    record: &mut ActionRecord,
) {
    let boss_stats = boss.effective_stats();
    let fighter_stats = fighter.effective_stats();
    let outcome = damage::resolve(
        Attacker {
            stats: &boss_stats,
            element: boss.profile.element,
        },
        Defender {
            stats: &fighter_stats,
            affinities: &fighter.affinities,
        },
        opts,
    );
    fighter.hp = damage::apply_damage(fighter.hp, outcome.damage);
    boss.hp = damage::apply_damage(boss.hp, outcome.reflected_damage);
    record.damage = outcome.damage;
    record.reflected = outcome.reflected;
    record.reflected_damage = outcome.reflected_damage;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{
        Affinities, Boss, BossSkill, CombatCharacter, CombatProfile, CommonSkill,
    };
    use crate::random::PcgRng;

    /// Scripted source: every roll returns the same value.
    struct Fixed(u64);

    impl RandomSource for Fixed {
        fn next_u64(&mut self) -> u64 {
            self.0
        }
    }

    fn fighter(name: &str, stats: CombatStats, skills: Vec<CommonSkill>) -> Fighter {
        let mut profile = CombatProfile {
            stats,
            ..CombatProfile::default()
        };
        for skill in &skills {
            profile.equip(&skill.name).unwrap();
        }
        Fighter::new(
            CombatCharacter {
                name: name.to_string(),
                profile,
            },
            &skills,
        )
    }

    fn boss(stats: CombatStats) -> BossFighter {
        BossFighter::new(Boss::new("Golem", stats, ElementalType::Neutral))
    }

    fn battle(boss: BossFighter, party: Vec<Fighter>) -> Battle {
        Battle::new(boss, party, &GameConfig::default()).unwrap()
    }

    #[test]
    fn two_attacks_defeat_a_hundred_hp_boss() {
        let mut battle = battle(
            boss(CombatStats::new(100, 1, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(500, 60, 0, 10, 10), vec![])],
        );
        let mut rng = PcgRng::new(1);

        let report = battle.submit(PlayerAction::Attack, &mut rng).unwrap();
        assert_eq!(report.player.damage, 60);
        assert_eq!(battle.boss().hp, 40);
        assert_eq!(report.status, BattleStatus::Active);
        assert!(report.boss.is_some());
        assert_eq!(battle.turn(), 1);

        let report = battle.submit(PlayerAction::Attack, &mut rng).unwrap();
        assert_eq!(report.status, BattleStatus::Victory);
        assert_eq!(battle.boss().hp, 0);
        assert!(report.boss.is_none());

        assert_eq!(
            battle.submit(PlayerAction::Attack, &mut rng),
            Err(ActionError::BattleOver(BattleStatus::Victory))
        );
    }

    #[test]
    fn forfeit_is_terminal_and_untouched() {
        let mut battle = battle(
            boss(CombatStats::new(100, 50, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 10), vec![])],
        );
        let report = battle.submit(PlayerAction::Forfeit, &mut Fixed(0)).unwrap();
        assert_eq!(report.status, BattleStatus::Forfeit);
        assert_eq!(battle.boss().hp, 100);
        assert_eq!(battle.current_character().hp, 100);
    }

    #[test]
    fn skill_without_equipment_consumes_no_turn() {
        let mut battle = battle(
            boss(CombatStats::new(100, 50, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 10), vec![])],
        );
        let before = battle.clone();
        assert!(matches!(
            battle.submit(PlayerAction::UseSkill, &mut Fixed(0)),
            Err(ActionError::NoSkillsEquipped { .. })
        ));
        assert_eq!(battle, before);
    }

    #[test]
    fn insufficient_sp_consumes_no_turn() {
        let mut flare = CommonSkill::new("Flare", ElementalType::Fire);
        flare.cost = 50;
        flare.damage = 30;
        let mut battle = battle(
            boss(CombatStats::new(100, 50, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 40), vec![flare])],
        );
        let before = battle.clone();
        let err = battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientResource {
                skill: "Flare".to_string(),
                resource: ResourceKind::Sp,
                required: 50,
                available: 40,
            }
        );
        assert_eq!(battle, before);
    }

    #[test]
    fn skill_deducts_cost_and_uses_fixed_damage() {
        let mut flare = CommonSkill::new("Flare", ElementalType::Fire);
        flare.cost = 20;
        flare.damage = 45;
        flare.cooldown = 3;
        let mut battle = battle(
            boss(CombatStats::new(500, 1, 900, 1, 1)),
            vec![fighter("Aria", CombatStats::new(500, 10, 0, 10, 100), vec![flare])],
        );

        let report = battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap();
        assert_eq!(report.player.action, Move::Skill("Flare".to_string()));
        assert_eq!(report.player.damage, 45);
        assert_eq!(battle.current_character().sp, 80);
        // Cooldown 3, ticked once at end of turn.
        assert_eq!(battle.current_character().cooldowns.remaining("Flare"), 2);

        assert!(matches!(
            battle.submit(PlayerAction::UseSkill, &mut Fixed(0)),
            Err(ActionError::AllSkillsOnCooldown { .. })
        ));
    }

    #[test]
    fn hp_cost_skill_checks_current_hp() {
        let mut blood = CommonSkill::new("Blood Pact", ElementalType::Dark);
        blood.resource = ResourceKind::Hp;
        blood.cost = 30;
        blood.damage = 10;
        let mut battle = battle(
            boss(CombatStats::new(500, 1, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 10), vec![blood])],
        );
        battle.party[0].hp = 29;
        assert!(matches!(
            battle.submit(PlayerAction::UseSkill, &mut Fixed(0)),
            Err(ActionError::InsufficientResource { resource: ResourceKind::Hp, .. })
        ));

        battle.party[0].hp = 60;
        battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap();
        // 60 - 30 cost - 1 boss attack (max(1, 1 - 0))
        assert_eq!(battle.current_character().hp, 29);
    }

    #[test]
    fn buff_lands_on_caster_and_debuff_on_boss() {
        let mut rally = CommonSkill::new("Rally", ElementalType::Neutral);
        rally.effect = Some(EffectTag::buff(ModifiedStat::Atk));
        rally.duration = 3;
        rally.cooldown = 2;
        let mut sunder = CommonSkill::new("Sunder", ElementalType::Neutral);
        sunder.effect = Some(EffectTag::debuff(ModifiedStat::Def));
        sunder.duration = 3;

        let mut battle = battle(
            boss(CombatStats::new(1000, 1, 0, 1, 1)),
            vec![fighter(
                "Aria",
                CombatStats::new(500, 100, 0, 10, 10),
                vec![rally, sunder],
            )],
        );

        battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap();
        assert!(battle.current_character().modifiers.is_active(ModifiedStat::Atk, Direction::Up));

        let report = battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap();
        assert_eq!(report.player.action, Move::Skill("Sunder".to_string()));
        assert!(battle.boss().modifiers.is_active(ModifiedStat::Def, Direction::Down));

        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        assert_eq!(report.player.damage, 130);
    }

    #[test]
    fn heal_restores_up_to_max() {
        let mut mend = CommonSkill::new("Mend", ElementalType::Light);
        mend.damage = 40;
        mend.effect = Some(EffectTag::Heal);
        let mut battle = battle(
            boss(CombatStats::new(1000, 1, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 10), vec![mend])],
        );
        battle.party[0].hp = 80;
        let report = battle.submit(PlayerAction::UseSkill, &mut Fixed(0)).unwrap();
        assert_eq!(report.player.healed, 20);
        assert_eq!(report.player.damage, 40);
        // Full HP after heal, then the boss hits for 1.
        assert_eq!(battle.current_character().hp, 99);
    }

    #[test]
    fn defend_lasts_for_the_boss_counter_only() {
        let mut battle = battle(
            boss(CombatStats::new(1000, 100, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(500, 10, 50, 10, 10), vec![])],
        );
        battle.submit(PlayerAction::Defend, &mut Fixed(0)).unwrap();
        // def 50 * 1.3 = 65, boss atk 100 → 35
        assert_eq!(battle.current_character().hp, 465);
        assert!(battle.current_character().modifiers.is_empty());
    }

    #[test]
    fn reflect_hurts_the_attacker() {
        let mut golem = Boss::new("Golem", CombatStats::new(500, 1, 0, 1, 1), ElementalType::Neutral);
        golem.affinities = Affinities::default().with_reflect(ElementalType::Fire, 50);
        let mut aria = fighter("Aria", CombatStats::new(100, 80, 0, 10, 10), vec![]);
        aria.element = ElementalType::Fire;

        let mut battle = battle(BossFighter::new(golem), vec![aria]);
        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        assert!(report.player.reflected);
        assert_eq!(report.player.reflected_damage, 40);
        assert_eq!(battle.boss().hp, 500);
        // 100 - 40 reflected - 1 boss attack
        assert_eq!(battle.current_character().hp, 59);
    }

    #[test]
    fn knocked_out_character_hands_over_then_defeat() {
        let mut battle = battle(
            boss(CombatStats::new(1000, 200, 0, 1, 1)),
            vec![
                fighter("Aria", CombatStats::new(150, 10, 0, 10, 10), vec![]),
                fighter("Bran", CombatStats::new(150, 10, 0, 10, 10), vec![]),
            ],
        );

        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        assert_eq!(report.knocked_out.as_deref(), Some("Aria"));
        assert_eq!(report.next_character.as_deref(), Some("Bran"));
        assert_eq!(battle.current_index(), 1);
        assert_eq!(report.status, BattleStatus::Active);

        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        assert_eq!(report.knocked_out.as_deref(), Some("Bran"));
        assert_eq!(report.status, BattleStatus::Defeat);
        assert_eq!(battle.status(), BattleStatus::Defeat);
    }

    #[test]
    fn boss_uses_skills_when_bias_allows() {
        let mut golem = Boss::new("Golem", CombatStats::new(1000, 1, 0, 1, 1), ElementalType::Earth);
        let mut quake = BossSkill::new("Quake", ElementalType::Earth, 70);
        quake.effect = Some(EffectTag::debuff(ModifiedStat::Atk));
        quake.cooldown = 3;
        golem.add_skill(quake).unwrap();

        let mut battle = battle(
            BossFighter::new(golem),
            vec![fighter("Aria", CombatStats::new(500, 10, 0, 10, 10), vec![])],
        );

        // Fixed(0): chance(60) succeeds, index 0 picks Quake.
        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        let boss_move = report.boss.unwrap();
        assert_eq!(boss_move.action, Move::Skill("Quake".to_string()));
        assert_eq!(boss_move.damage, 70);
        assert!(battle.current_character().modifiers.is_active(ModifiedStat::Atk, Direction::Down));
        assert_eq!(battle.boss().cooldowns.remaining("Quake"), 2);

        // Quake on cooldown: plain attack.
        let report = battle.submit(PlayerAction::Attack, &mut Fixed(0)).unwrap();
        assert_eq!(report.boss.unwrap().action, Move::Attack);
    }

    #[test]
    fn zero_bias_always_attacks() {
        let mut golem = Boss::new("Golem", CombatStats::new(1000, 1, 0, 1, 1), ElementalType::Earth);
        golem.add_skill(BossSkill::new("Quake", ElementalType::Earth, 70)).unwrap();
        let mut battle = Battle::new(
            BossFighter::new(golem),
            vec![fighter("Aria", CombatStats::new(500, 10, 0, 10, 10), vec![])],
            &GameConfig::with_boss_skill_bias(0),
        )
        .unwrap();
        let mut rng = PcgRng::new(11);
        for _ in 0..20 {
            let report = battle.submit(PlayerAction::Defend, &mut rng).unwrap();
            assert_eq!(report.boss.unwrap().action, Move::Attack);
        }
    }

    #[test]
    fn sp_regenerates_every_third_turn() {
        let mut battle = battle(
            boss(CombatStats::new(1000, 1, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(500, 10, 0, 10, 100), vec![])],
        );
        battle.party[0].sp = 50;

        let regen: Vec<u32> = (0..7)
            .map(|_| battle.submit(PlayerAction::Defend, &mut Fixed(0)).unwrap().sp_regenerated)
            .collect();
        assert_eq!(regen, vec![0, 0, 0, 10, 0, 0, 10]);
        assert_eq!(battle.current_character().sp, 70);
    }

    #[test]
    fn expire_only_affects_active_battles() {
        let mut battle = battle(
            boss(CombatStats::new(100, 1, 0, 1, 1)),
            vec![fighter("Aria", CombatStats::new(100, 10, 0, 10, 10), vec![])],
        );
        assert!(battle.expire());
        assert_eq!(battle.status(), BattleStatus::Timeout);
        assert!(!battle.expire());
    }

    #[test]
    fn empty_party_is_rejected() {
        assert_eq!(
            Battle::new(boss(CombatStats::new(1, 1, 1, 1, 1)), vec![], &GameConfig::default()),
            Err(ValidationError::EmptyParty)
        );
    }
}
