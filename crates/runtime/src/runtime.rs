//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires the services to one record
//! store, one economy gateway and one random source, and exposes a
//! builder-based API for clients.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gacha_core::{GameConfig, RandomSource};
use tokio::task::JoinHandle;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::combat::{CombatService, RegistryConfig, SessionRegistry};
use crate::events::EventBus;
use crate::providers::{EconomyGateway, EntropySource, NoopEconomy};
use crate::repository::{FileGuildStore, GuildRecords, GuildStore, InMemoryGuildStore};
use crate::services::{
    AdminService, DEFAULT_CONFIRM_TIMEOUT, DrawService, EconomyService, UserLocks, shared_rng,
};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub sessions: RegistryConfig,
    pub event_buffer_size: usize,
    /// Upper bound on a single economy credit.
    pub payout_timeout: Duration,
    /// Minimum time between two draws of the same user.
    pub spin_cooldown: Duration,
    /// How long a destructive admin request waits for confirmation.
    pub confirm_timeout: Duration,
    /// Directory of the file-backed guild store; in-memory when unset.
    pub data_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            sessions: RegistryConfig::default(),
            event_buffer_size: 100,
            payout_timeout: Duration::from_secs(5),
            spin_cooldown: Duration::from_secs(5),
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            data_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `GACHA_DATA_DIR`
    /// - `GACHA_MAX_SESSIONS_PER_GUILD`
    /// - `GACHA_TURN_TIMEOUT_SECS` / `GACHA_SWEEP_INTERVAL_SECS` / `GACHA_MAX_IDLE_SECS`
    /// - `GACHA_EVENT_BUFFER`
    /// - `GACHA_PAYOUT_TIMEOUT_MS`
    /// - `GACHA_SPIN_COOLDOWN_SECS`
    /// - `GACHA_CONFIRM_TIMEOUT_SECS`
    /// - `GACHA_BOSS_SKILL_BIAS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("GACHA_DATA_DIR") {
            config.data_dir = Some(dir);
        }
        if let Some(limit) = read_env::<usize>("GACHA_MAX_SESSIONS_PER_GUILD") {
            config.sessions.max_sessions_per_guild = limit.max(1);
        }
        if let Some(secs) = read_env::<u64>("GACHA_TURN_TIMEOUT_SECS") {
            config.sessions.turn_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("GACHA_SWEEP_INTERVAL_SECS") {
            config.sessions.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("GACHA_MAX_IDLE_SECS") {
            config.sessions.max_idle = Duration::from_secs(secs.max(1));
        }
        if let Some(capacity) = read_env::<usize>("GACHA_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(ms) = read_env::<u64>("GACHA_PAYOUT_TIMEOUT_MS") {
            config.payout_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = read_env::<u64>("GACHA_SPIN_COOLDOWN_SECS") {
            config.spin_cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("GACHA_CONFIRM_TIMEOUT_SECS") {
            config.confirm_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(bias) = read_env::<u8>("GACHA_BOSS_SKILL_BIAS") {
            config.game_config = GameConfig::with_boss_skill_bias(bias);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Main runtime that owns the session worker.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    session_worker: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Drop every active battle and wait for the session worker to stop.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.combat().registry().shutdown().await?;
        drop(self.handle);
        self.session_worker
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        tracing::info!("runtime stopped");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn GuildStore>>,
    economy: Option<Arc<dyn EconomyGateway>>,
    rng: Option<Box<dyn RandomSource>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            economy: None,
            rng: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific record store instead of the configured one.
    pub fn store(mut self, store: Arc<dyn GuildStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// External economy (defaults to [`NoopEconomy`]).
    pub fn economy(mut self, economy: Arc<dyn EconomyGateway>) -> Self {
        self.economy = Some(economy);
        self
    }

    /// Random source for draws and boss behaviour (defaults to OS entropy).
    pub fn rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Build the runtime and spawn its worker.
    pub async fn build(self) -> Result<Runtime> {
        let config = self.config;

        let store: Arc<dyn GuildStore> = match (self.store, &config.data_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(FileGuildStore::new(dir)?),
            (None, None) => Arc::new(InMemoryGuildStore::new()),
        };
        let records = GuildRecords::new(store);
        let economy = self.economy.unwrap_or_else(|| Arc::new(NoopEconomy));
        let rng = match self.rng {
            Some(rng) => shared_rng(rng),
            None => shared_rng(EntropySource::from_os()),
        };
        let events = EventBus::with_capacity(config.event_buffer_size);
        let locks = UserLocks::new();

        let (registry, session_worker) =
            SessionRegistry::spawn(config.sessions.clone(), Arc::clone(&rng), events.clone());

        let handle = RuntimeHandle::new(
            DrawService::new(
                records.clone(),
                Arc::clone(&economy),
                rng,
                locks.clone(),
                events.clone(),
                config.spin_cooldown,
            ),
            EconomyService::new(
                records.clone(),
                Arc::clone(&economy),
                locks,
                config.payout_timeout,
            ),
            AdminService::new(records.clone()).with_confirm_timeout(config.confirm_timeout),
            CombatService::new(
                records,
                registry,
                economy,
                config.game_config.clone(),
                config.payout_timeout,
            ),
            events,
        );

        tracing::info!(
            data_dir = ?config.data_dir,
            max_sessions_per_guild = config.sessions.max_sessions_per_guild,
            "runtime started"
        );

        Ok(Runtime {
            handle,
            session_worker,
        })
    }
}
