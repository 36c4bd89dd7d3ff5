//! Cloneable handle to the session worker.

use std::time::Duration;

use chrono::{DateTime, Utc};
use gacha_core::{Battle, GameConfig, GuildId, MessageId, PlayerAction, UserId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{Result, RuntimeError};
use crate::events::EventBus;
use crate::services::SharedRng;
use crate::workers::{Advanced, SessionCommand, SessionWorker};

/// One battle slot per (guild, initiating user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub guild: GuildId,
    pub user: UserId,
}

impl SessionKey {
    pub fn new(guild: GuildId, user: UserId) -> Self {
        Self { guild, user }
    }
}

/// An active battle as stored by the registry.
#[derive(Debug, Clone)]
pub struct CombatSession {
    /// Unique for the lifetime of the runtime; never reused.
    pub id: u64,
    pub key: SessionKey,
    pub battle: Battle,
    /// Outbound message the battle is rendered in, once known.
    pub message: Option<MessageId>,
    pub started_at: DateTime<Utc>,
    pub last_action: Instant,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub max_sessions_per_guild: usize,
    /// Idle time allowed per turn before the battle times out.
    pub turn_timeout: Duration,
    pub sweep_interval: Duration,
    /// Backstop for sessions whose timers were lost.
    pub max_idle: Duration,
    pub command_buffer_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_guild: GameConfig::MAX_SESSIONS_PER_GUILD,
            turn_timeout: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(5 * 60),
            max_idle: Duration::from_secs(30 * 60),
            command_buffer_size: 32,
        }
    }
}

/// Bounded per-guild map of active battles.
#[derive(Clone)]
pub struct SessionRegistry {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionRegistry {
    /// Spawns the session worker and returns a handle to it.
    pub fn spawn(
        config: RegistryConfig,
        rng: SharedRng,
        events: EventBus,
    ) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let worker = SessionWorker::new(command_rx, command_tx.downgrade(), rng, events, config);
        let handle = tokio::spawn(worker.run());
        (Self { command_tx }, handle)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::RegistryClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::RegistryClosed)
    }

    /// True while the guild is below its session cap.
    pub async fn can_start(&self, guild: GuildId) -> Result<bool> {
        self.request(|reply| SessionCommand::CanStart { guild, reply })
            .await
    }

    pub async fn count(&self, guild: GuildId) -> Result<usize> {
        self.request(|reply| SessionCommand::Count { guild, reply })
            .await
    }

    /// Registers a battle and arms its first turn timer.
    pub async fn create(&self, key: SessionKey, battle: Battle) -> Result<CombatSession> {
        let battle = Box::new(battle);
        self.request(|reply| SessionCommand::Create { key, battle, reply })
            .await?
    }

    pub async fn get(&self, key: SessionKey) -> Result<Option<CombatSession>> {
        self.request(|reply| SessionCommand::Get { key, reply }).await
    }

    pub async fn bind_message(&self, key: SessionKey, message: MessageId) -> Result<()> {
        self.request(|reply| SessionCommand::BindMessage {
            key,
            message,
            reply,
        })
        .await?
    }

    /// Resolves one turn. A terminal turn removes the session before this
    /// returns.
    pub async fn advance(
        &self,
        key: SessionKey,
        message: Option<MessageId>,
        action: PlayerAction,
    ) -> Result<Advanced> {
        self.request(|reply| SessionCommand::Advance {
            key,
            message,
            action,
            reply,
        })
        .await?
    }

    pub async fn remove(&self, key: SessionKey) -> Result<Option<CombatSession>> {
        self.request(|reply| SessionCommand::Remove { key, reply })
            .await
    }

    /// Drops every session and stops the worker.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }
}
