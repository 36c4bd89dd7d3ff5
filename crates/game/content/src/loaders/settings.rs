//! Per-guild settings loader.

use std::path::Path;

use gacha_core::{GameConfig, ValidationError, validation};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Tunables an operator may set per guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    /// Draws per SSR guarantee.
    pub pity_max: u32,
    pub boss_skill_bias_percent: u8,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            pity_max: GameConfig::DEFAULT_PITY_MAX,
            boss_skill_bias_percent: GameConfig::DEFAULT_BOSS_SKILL_BIAS_PERCENT,
        }
    }
}

impl GuildSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::pity_max(self.pity_max)?;
        validation::at_most("boss_skill_bias_percent", u32::from(self.boss_skill_bias_percent), 100)?;
        Ok(())
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::with_boss_skill_bias(self.boss_skill_bias_percent)
    }
}

/// Loader for guild settings from TOML files.
pub struct SettingsLoader;

impl SettingsLoader {
    pub fn load(path: &Path) -> LoadResult<GuildSettings> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GuildSettings> {
        let settings: GuildSettings = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}
