//! Session worker that owns every active battle.
//!
//! Receives commands from [`SessionRegistry`](crate::combat::SessionRegistry),
//! resolves turns through [`gacha_core::Battle`], arms per-turn timers and
//! periodically sweeps idle sessions. All session state lives in this task,
//! so commands for the same session are applied strictly in order.

use std::collections::HashMap;

use chrono::Utc;
use gacha_core::{Battle, GuildId, MessageId, PlayerAction, TurnReport};
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError};
use crate::combat::{CombatSession, RegistryConfig, SessionKey};
use crate::events::{CombatEvent, CombatOutcome, Event, EventBus};
use crate::services::SharedRng;

/// A resolved turn and the session as it stands afterwards.
#[derive(Debug, Clone)]
pub struct Advanced {
    pub session: CombatSession,
    pub report: TurnReport,
}

/// Commands accepted by the session worker.
pub enum SessionCommand {
    CanStart {
        guild: GuildId,
        reply: oneshot::Sender<bool>,
    },
    Count {
        guild: GuildId,
        reply: oneshot::Sender<usize>,
    },
    Create {
        key: SessionKey,
        battle: Box<Battle>,
        reply: oneshot::Sender<Result<CombatSession>>,
    },
    Get {
        key: SessionKey,
        reply: oneshot::Sender<Option<CombatSession>>,
    },
    BindMessage {
        key: SessionKey,
        message: MessageId,
        reply: oneshot::Sender<Result<()>>,
    },
    Advance {
        key: SessionKey,
        message: Option<MessageId>,
        action: PlayerAction,
        reply: oneshot::Sender<Result<Advanced>>,
    },
    Remove {
        key: SessionKey,
        reply: oneshot::Sender<Option<CombatSession>>,
    },
    /// Posted by a turn timer. Ignored unless the session and turn still match.
    Expire {
        key: SessionKey,
        session: u64,
        turn: u32,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct Slot {
    session: CombatSession,
    timer: Option<AbortHandle>,
}

impl Slot {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

pub struct SessionWorker {
    sessions: HashMap<SessionKey, Slot>,
    command_rx: mpsc::Receiver<SessionCommand>,
    timer_tx: mpsc::WeakSender<SessionCommand>,
    rng: SharedRng,
    events: EventBus,
    config: RegistryConfig,
    next_id: u64,
}

impl SessionWorker {
    pub fn new(
        command_rx: mpsc::Receiver<SessionCommand>,
        timer_tx: mpsc::WeakSender<SessionCommand>,
        rng: SharedRng,
        events: EventBus,
        config: RegistryConfig,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            command_rx,
            timer_tx,
            rng,
            events,
            config,
            next_id: 1,
        }
    }

    /// Main worker loop. Ends on `Shutdown` or when every handle is dropped.
    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval_at(
            Instant::now() + self.config.sweep_interval,
            self.config.sweep_interval,
        );
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown { reply }) => {
                        self.clear();
                        if reply.send(()).is_err() {
                            debug!("Shutdown reply channel closed (caller dropped)");
                        }
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                _ = sweep.tick() => self.sweep(),
            }
        }
        self.clear();
        debug!("session worker stopped");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::CanStart { guild, reply } => {
                let _ = reply.send(self.count(guild) < self.config.max_sessions_per_guild);
            }
            SessionCommand::Count { guild, reply } => {
                let _ = reply.send(self.count(guild));
            }
            SessionCommand::Create { key, battle, reply } => {
                let result = self.create(key, *battle);
                if reply.send(result).is_err() {
                    debug!("Create reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Get { key, reply } => {
                let _ = reply.send(self.sessions.get(&key).map(|slot| slot.session.clone()));
            }
            SessionCommand::BindMessage {
                key,
                message,
                reply,
            } => {
                let result = match self.sessions.get_mut(&key) {
                    Some(slot) => {
                        slot.session.message = Some(message);
                        Ok(())
                    }
                    None => Err(RuntimeError::NoSession),
                };
                let _ = reply.send(result);
            }
            SessionCommand::Advance {
                key,
                message,
                action,
                reply,
            } => {
                let result = self.advance(key, message, action).await;
                if reply.send(result).is_err() {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Remove { key, reply } => {
                let removed = self.sessions.remove(&key).map(|mut slot| {
                    slot.disarm();
                    slot.session
                });
                let _ = reply.send(removed);
            }
            SessionCommand::Expire { key, session, turn } => self.expire(key, session, turn),
            SessionCommand::Shutdown { reply } => {
                self.clear();
                let _ = reply.send(());
            }
        }
    }

    fn count(&self, guild: GuildId) -> usize {
        self.sessions.keys().filter(|key| key.guild == guild).count()
    }

    fn create(&mut self, key: SessionKey, battle: Battle) -> Result<CombatSession> {
        if self.sessions.contains_key(&key) {
            return Err(RuntimeError::SessionExists);
        }
        let limit = self.config.max_sessions_per_guild;
        if self.count(key.guild) >= limit {
            return Err(RuntimeError::GuildAtCapacity {
                guild: key.guild,
                limit,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let session = CombatSession {
            id,
            key,
            battle,
            message: None,
            started_at: Utc::now(),
            last_action: Instant::now(),
        };

        info!(
            guild = %key.guild,
            user = %key.user,
            session = id,
            boss = %session.battle.boss().name(),
            "battle started"
        );
        self.events.publish(Event::Combat(CombatEvent::Started {
            guild: key.guild,
            user: key.user,
            session: id,
            boss: session.battle.boss().name().to_string(),
            party: session.battle.party().iter().map(|f| f.name.clone()).collect(),
        }));

        let timer = self.arm_timer(key, id, 0);
        self.sessions.insert(
            key,
            Slot {
                session: session.clone(),
                timer: Some(timer),
            },
        );
        Ok(session)
    }

    async fn advance(
        &mut self,
        key: SessionKey,
        message: Option<MessageId>,
        action: PlayerAction,
    ) -> Result<Advanced> {
        let slot = self.sessions.get_mut(&key).ok_or(RuntimeError::NoSession)?;
        if let (Some(bound), Some(given)) = (slot.session.message, message) {
            if bound != given {
                return Err(RuntimeError::ForeignMessage);
            }
        }

        let report = {
            let mut rng = self.rng.lock().await;
            slot.session.battle.submit(action, rng.as_mut())?
        };
        slot.session.last_action = Instant::now();

        let session = slot.session.clone();
        self.events.publish(Event::Combat(CombatEvent::TurnResolved {
            guild: key.guild,
            user: key.user,
            session: session.id,
            turn: report.turn,
            boss_hp: report.boss_hp,
        }));

        if let Some(outcome) = CombatOutcome::from_status(report.status) {
            if let Some(mut slot) = self.sessions.remove(&key) {
                slot.disarm();
            }
            self.finish(&session, outcome);
        } else {
            let timer = self.arm_timer(key, session.id, session.battle.turn());
            if let Some(slot) = self.sessions.get_mut(&key) {
                slot.disarm();
                slot.timer = Some(timer);
            }
        }

        Ok(Advanced { session, report })
    }

    fn expire(&mut self, key: SessionKey, id: u64, turn: u32) {
        let current = self
            .sessions
            .get(&key)
            .is_some_and(|slot| slot.session.id == id && slot.session.battle.turn() == turn);
        if !current {
            debug!(guild = %key.guild, user = %key.user, session = id, turn, "stale turn timer ignored");
            return;
        }
        if let Some(mut slot) = self.sessions.remove(&key) {
            slot.timer = None;
            slot.session.battle.expire();
            self.finish(&slot.session, CombatOutcome::Timeout);
        }
    }

    /// Evicts sessions idle for longer than the inactivity limit.
    fn sweep(&mut self) {
        let max_idle = self.config.max_idle;
        let idle: Vec<SessionKey> = self
            .sessions
            .iter()
            .filter(|(_, slot)| slot.session.last_action.elapsed() > max_idle)
            .map(|(key, _)| *key)
            .collect();

        for key in idle {
            if let Some(mut slot) = self.sessions.remove(&key) {
                slot.disarm();
                warn!(
                    guild = %key.guild,
                    user = %key.user,
                    session = slot.session.id,
                    "idle battle evicted"
                );
                self.finish(&slot.session, CombatOutcome::Evicted);
            }
        }
    }

    fn finish(&self, session: &CombatSession, outcome: CombatOutcome) {
        info!(
            guild = %session.key.guild,
            user = %session.key.user,
            session = session.id,
            %outcome,
            turns = session.battle.turn(),
            "battle ended"
        );
        self.events.publish(Event::Combat(CombatEvent::Ended {
            guild: session.key.guild,
            user: session.key.user,
            session: session.id,
            outcome,
            turns: session.battle.turn(),
        }));
    }

    /// Spawns a timer that posts `Expire` for (session, turn) after the turn
    /// timeout. The timer holds a weak sender so it never keeps the worker
    /// alive on its own.
    fn arm_timer(&self, key: SessionKey, session: u64, turn: u32) -> AbortHandle {
        let timer_tx = self.timer_tx.clone();
        let timeout = self.config.turn_timeout;
        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(tx) = timer_tx.upgrade() else {
                return;
            };
            if tx
                .send(SessionCommand::Expire { key, session, turn })
                .await
                .is_err()
            {
                debug!("turn timer fired after the session worker stopped");
            }
        });
        task.abort_handle()
    }

    fn clear(&mut self) {
        for slot in self.sessions.values_mut() {
            slot.disarm();
        }
        self.sessions.clear();
    }
}
