//! Terminal driver configuration.
use std::env;
use std::path::PathBuf;

use gacha_core::{GuildId, UserId};

/// Who the terminal acts as and where it keeps its files.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub guild: GuildId,
    pub user: UserId,
    /// Guild catalog and settings (`catalog.ron`, `settings.toml`).
    pub content_dir: PathBuf,
    /// Persisted guild records.
    pub records_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Tickets of each kind granted to a user the first time they act.
    pub starting_tickets: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            guild: GuildId(1),
            user: UserId(1),
            content_dir: PathBuf::from("data"),
            records_dir: project_dir(|dirs| dirs.data_dir().join("records"), "./save_data"),
            log_dir: project_dir(|dirs| dirs.cache_dir().join("logs"), "/tmp/gacha-bot/logs"),
            starting_tickets: 20,
        }
    }
}

impl CliConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GACHA_GUILD_ID` / `GACHA_USER_ID` - Snowflakes to act as (default: 1)
    /// - `GACHA_CONTENT_DIR` - Catalog directory (default: `./data`)
    /// - `GACHA_RECORDS_DIR` - Record store (default: platform data dir)
    /// - `GACHA_LOG_DIR` - Log directory (default: platform cache dir)
    /// - `GACHA_STARTING_TICKETS` - Tickets per kind for new users (default: 20)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(guild) = read_env::<GuildId>("GACHA_GUILD_ID") {
            config.guild = guild;
        }
        if let Some(user) = read_env::<UserId>("GACHA_USER_ID") {
            config.user = user;
        }
        if let Some(dir) = read_env::<PathBuf>("GACHA_CONTENT_DIR") {
            config.content_dir = dir;
        }
        if let Some(dir) = read_env::<PathBuf>("GACHA_RECORDS_DIR") {
            config.records_dir = dir;
        }
        if let Some(dir) = read_env::<PathBuf>("GACHA_LOG_DIR") {
            config.log_dir = dir;
        }
        if let Some(tickets) = read_env::<u32>("GACHA_STARTING_TICKETS") {
            config.starting_tickets = tickets;
        }

        config
    }
}

fn project_dir(pick: impl FnOnce(&directories::ProjectDirs) -> PathBuf, fallback: &str) -> PathBuf {
    directories::ProjectDirs::from("", "", "gacha-bot")
        .map(|dirs| pick(&dirs))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
