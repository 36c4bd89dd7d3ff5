/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Chance (0-100) that a boss with an available skill uses it instead of
    /// a plain attack.
    pub boss_skill_bias_percent: u8,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_EQUIPPED_SKILLS: usize = 3;
    pub const MAX_BOSS_SKILLS: usize = 3;
    pub const TEN_DRAW_COUNT: usize = 10;

    // ===== catalog limits =====
    pub const MIN_STAT: u32 = 1;
    pub const MAX_STAT: u32 = 1000;
    pub const MAX_REFLECT_PERCENT: u8 = 100;
    pub const MIN_PITY_MAX: u32 = 1;
    pub const MAX_PITY_MAX: u32 = 500;
    /// Upper bound for skill cooldowns and effect durations.
    pub const MAX_SKILL_TURNS: u32 = 10;

    // ===== combat rules =====
    pub const SP_REGEN_AMOUNT: u32 = 10;
    pub const SP_REGEN_INTERVAL: u32 = 3;
    pub const DEFEND_DURATION: u32 = 1;
    pub const DEFAULT_EFFECT_DURATION: u32 = 3;

    // ===== session limits =====
    pub const MAX_SESSIONS_PER_GUILD: usize = 5;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PITY_MAX: u32 = 90;
    pub const DEFAULT_BOSS_SKILL_BIAS_PERCENT: u8 = 60;

    pub fn new() -> Self {
        Self {
            boss_skill_bias_percent: Self::DEFAULT_BOSS_SKILL_BIAS_PERCENT,
        }
    }

    pub fn with_boss_skill_bias(percent: u8) -> Self {
        Self {
            boss_skill_bias_percent: percent.min(100),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
