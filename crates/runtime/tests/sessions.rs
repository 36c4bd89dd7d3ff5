use std::sync::Arc;
use std::time::Duration;

use gacha_core::{
    BattleStatus, GuildId, MessageId, PlayerAction, RandomSource, Rarity, UserId, ValidationError,
};
use gacha_runtime::{
    BossField, CombatEvent, CombatOutcome, Event, ItemField, LedgerEconomy, PayoutStatus,
    RegistryConfig, Runtime, RuntimeConfig, RuntimeError, RuntimeHandle, Topic,
};
use tokio::sync::broadcast;

const GUILD: GuildId = GuildId(1);
const USER: UserId = UserId(100);

struct Zero;

impl RandomSource for Zero {
    fn next_u64(&mut self) -> u64 {
        0
    }
}

fn config(sessions: RegistryConfig) -> RuntimeConfig {
    RuntimeConfig {
        sessions,
        spin_cooldown: Duration::ZERO,
        ..RuntimeConfig::default()
    }
}

/// Hero hits for 60 against a 100 HP boss whose attacks barely scratch.
fn seed_arena(handle: &RuntimeHandle) {
    let admin = handle.admin();
    admin.create_item(GUILD, "Hero", 10, Rarity::SR).unwrap();
    admin.edit_item(GUILD, "hero", ItemField::Atk, "61").unwrap();

    admin.create_boss(GUILD, "Golem").unwrap();
    admin.edit_boss(GUILD, "golem", BossField::Hp, "100").unwrap();
    admin.edit_boss(GUILD, "golem", BossField::Atk, "1").unwrap();
    admin.edit_boss(GUILD, "golem", BossField::Def, "1").unwrap();
    admin.edit_boss(GUILD, "golem", BossField::Reward, "250").unwrap();
}

async fn arena(sessions: RegistryConfig, economy: Arc<LedgerEconomy>) -> Runtime {
    let runtime = Runtime::builder()
        .config(config(sessions))
        .economy(economy)
        .rng(Zero)
        .build()
        .await
        .unwrap();
    seed_arena(&runtime.handle());
    runtime
}

async fn next_end(events: &mut broadcast::Receiver<Event>) -> (u64, CombatOutcome) {
    loop {
        if let Event::Combat(CombatEvent::Ended {
            session, outcome, ..
        }) = events.recv().await.unwrap()
        {
            return (session, outcome);
        }
    }
}

#[tokio::test]
async fn victory_removes_the_session_and_pays_the_reward() {
    let economy = Arc::new(LedgerEconomy::new());
    let runtime = arena(RegistryConfig::default(), economy.clone()).await;
    let handle = runtime.handle();

    let session = handle.start_session(GUILD, USER, "gol", &["her"]).await.unwrap();
    assert_eq!(session.battle.boss().name(), "Golem");
    assert_eq!(session.battle.party()[0].name, "Hero");

    let first = handle
        .submit_action(GUILD, USER, None, PlayerAction::Attack)
        .await
        .unwrap();
    assert_eq!(first.report.status, BattleStatus::Active);
    assert_eq!(first.report.boss_hp, 40);
    assert!(first.payout.is_none());
    assert_eq!(first.session.battle.turn(), 1);

    let second = handle
        .submit_action(GUILD, USER, None, PlayerAction::Attack)
        .await
        .unwrap();
    assert_eq!(second.report.status, BattleStatus::Victory);
    assert_eq!(second.payout, Some(PayoutStatus::Paid { amount: 250 }));
    assert_eq!(economy.balance(GUILD, USER).await, 250);

    assert!(handle.combat().session(GUILD, USER).await.unwrap().is_none());
    assert!(matches!(
        handle
            .submit_action(GUILD, USER, None, PlayerAction::Attack)
            .await,
        Err(RuntimeError::NoSession)
    ));
}

#[tokio::test]
async fn failed_payout_still_ends_the_battle() {
    let economy = Arc::new(LedgerEconomy::new());
    let runtime = arena(RegistryConfig::default(), economy.clone()).await;
    let handle = runtime.handle();

    handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    handle
        .submit_action(GUILD, USER, None, PlayerAction::Attack)
        .await
        .unwrap();

    economy.set_offline(true);
    let outcome = handle
        .submit_action(GUILD, USER, None, PlayerAction::Attack)
        .await
        .unwrap();
    assert_eq!(outcome.report.status, BattleStatus::Victory);
    assert!(matches!(
        outcome.payout,
        Some(PayoutStatus::Failed { amount: 250, .. })
    ));
    assert!(handle.combat().session(GUILD, USER).await.unwrap().is_none());

    economy.set_offline(false);
    assert_eq!(economy.balance(GUILD, USER).await, 0);
}

#[tokio::test]
async fn guild_is_capped_and_users_hold_one_battle() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();

    for user in 1..=5 {
        handle
            .start_session(GUILD, UserId(user), "golem", &["hero"])
            .await
            .unwrap();
    }
    assert!(!handle.combat().can_start(GUILD).await.unwrap());
    assert_eq!(handle.combat().registry().count(GUILD).await.unwrap(), 5);

    assert!(matches!(
        handle.start_session(GUILD, UserId(1), "golem", &["hero"]).await,
        Err(RuntimeError::SessionExists)
    ));
    assert!(matches!(
        handle.start_session(GUILD, UserId(6), "golem", &["hero"]).await,
        Err(RuntimeError::GuildAtCapacity { limit: 5, .. })
    ));

    // Other guilds are unaffected.
    let other = GuildId(2);
    handle.admin().create_item(other, "Hero", 10, Rarity::SR).unwrap();
    handle.admin().create_boss(other, "Golem").unwrap();
    assert!(handle.combat().can_start(other).await.unwrap());
    handle
        .start_session(other, UserId(6), "golem", &["hero"])
        .await
        .unwrap();

    handle
        .submit_action(GUILD, UserId(1), None, PlayerAction::Forfeit)
        .await
        .unwrap();
    assert!(handle.combat().can_start(GUILD).await.unwrap());
}

#[tokio::test]
async fn party_is_validated() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();
    let admin = handle.admin();
    admin.create_item(GUILD, "Locked", 10, Rarity::SSR).unwrap();
    admin.edit_item(GUILD, "locked", ItemField::Unlock, "locked-role").unwrap();
    admin.create_item(GUILD, "Coin", 10, Rarity::R).unwrap();
    admin.edit_item(GUILD, "coin", ItemField::Kind, "object").unwrap();

    assert!(matches!(
        handle.start_session(GUILD, USER, "dragon", &["hero"]).await,
        Err(RuntimeError::Validation(ValidationError::NotFound { kind: "boss", .. }))
    ));
    assert!(matches!(
        handle.start_session(GUILD, USER, "golem", &["nobody"]).await,
        Err(RuntimeError::Validation(ValidationError::NotFound { .. }))
    ));
    assert!(matches!(
        handle.start_session(GUILD, USER, "golem", &["locked"]).await,
        Err(RuntimeError::NotOwned(name)) if name == "Locked"
    ));
    assert!(matches!(
        handle.start_session(GUILD, USER, "golem", &["coin"]).await,
        Err(RuntimeError::Validation(ValidationError::NotACharacter(_)))
    ));
    assert!(matches!(
        handle.start_session(GUILD, USER, "golem", &[]).await,
        Err(RuntimeError::Validation(ValidationError::EmptyParty))
    ));

    let session = handle
        .start_session(GUILD, USER, "golem", &["hero", "HERO", "he"])
        .await
        .unwrap();
    assert_eq!(session.battle.party().len(), 1);
}

#[tokio::test]
async fn actions_must_come_from_the_bound_message() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();

    handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    handle
        .combat()
        .bind_message(GUILD, USER, MessageId(7))
        .await
        .unwrap();

    assert!(matches!(
        handle
            .submit_action(GUILD, USER, Some(MessageId(8)), PlayerAction::Attack)
            .await,
        Err(RuntimeError::ForeignMessage)
    ));
    let session = handle.combat().session(GUILD, USER).await.unwrap().unwrap();
    assert_eq!(session.battle.turn(), 0);
    assert_eq!(session.message, Some(MessageId(7)));

    let outcome = handle
        .submit_action(GUILD, USER, Some(MessageId(7)), PlayerAction::Defend)
        .await
        .unwrap();
    assert_eq!(outcome.report.turn, 0);
    assert_eq!(outcome.session.battle.turn(), 1);
}

#[tokio::test]
async fn forfeit_ends_without_payout() {
    let economy = Arc::new(LedgerEconomy::new());
    let runtime = arena(RegistryConfig::default(), economy.clone()).await;
    let handle = runtime.handle();
    let mut events = handle.subscribe(Topic::Combat);

    let session = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    let outcome = handle
        .submit_action(GUILD, USER, None, PlayerAction::Forfeit)
        .await
        .unwrap();
    assert_eq!(outcome.report.status, BattleStatus::Forfeit);
    assert!(outcome.payout.is_none());
    assert_eq!(next_end(&mut events).await, (session.id, CombatOutcome::Forfeit));
    assert_eq!(economy.balance(GUILD, USER).await, 0);
}

#[tokio::test(start_paused = true)]
async fn idle_turn_times_out() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();
    let mut events = handle.subscribe(Topic::Combat);

    let session = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    assert_eq!(next_end(&mut events).await, (session.id, CombatOutcome::Timeout));
    assert!(handle.combat().session(GUILD, USER).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn acting_rearms_the_turn_timer() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();
    let mut events = handle.subscribe(Topic::Combat);

    let session = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    tokio::time::advance(Duration::from_secs(50)).await;
    handle
        .submit_action(GUILD, USER, None, PlayerAction::Defend)
        .await
        .unwrap();

    // Past the first turn's deadline, inside the second's.
    tokio::time::advance(Duration::from_secs(20)).await;
    tokio::task::yield_now().await;
    let current = handle.combat().session(GUILD, USER).await.unwrap().unwrap();
    assert_eq!(current.id, session.id);
    assert_eq!(current.battle.turn(), 1);

    assert_eq!(next_end(&mut events).await, (session.id, CombatOutcome::Timeout));
}

#[tokio::test(start_paused = true)]
async fn sweep_evicts_idle_sessions() {
    let sessions = RegistryConfig {
        turn_timeout: Duration::from_secs(3_600),
        sweep_interval: Duration::from_secs(30),
        max_idle: Duration::from_secs(10),
        ..RegistryConfig::default()
    };
    let runtime = arena(sessions, Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();
    let mut events = handle.subscribe(Topic::Combat);

    let session = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    assert_eq!(next_end(&mut events).await, (session.id, CombatOutcome::Evicted));
    assert_eq!(handle.combat().registry().count(GUILD).await.unwrap(), 0);
}

#[tokio::test]
async fn session_ids_are_never_reused() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();

    let first = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    handle
        .submit_action(GUILD, USER, None, PlayerAction::Forfeit)
        .await
        .unwrap();
    let second = handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn shutdown_closes_the_registry() {
    let runtime = arena(RegistryConfig::default(), Arc::new(LedgerEconomy::new())).await;
    let handle = runtime.handle();
    handle.start_session(GUILD, USER, "golem", &["hero"]).await.unwrap();

    runtime.shutdown().await.unwrap();
    assert!(matches!(
        handle.combat().session(GUILD, USER).await,
        Err(RuntimeError::RegistryClosed)
    ));
}
