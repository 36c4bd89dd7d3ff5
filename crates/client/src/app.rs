//! Interactive loop over stdin.
//!
//! The terminal stands in for a chat front end: every line is one command
//! from the current user, each battle gets its own fake message id, and
//! battle endings that happen in the background are printed as they arrive.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use gacha_content::ContentFactory;
use gacha_core::{CommonSkill, GameError, GuildId, MessageId, UserId};
use gacha_runtime::{
    CombatEvent, CombatOutcome, Event, LedgerEconomy, RuntimeError, RuntimeHandle, TicketKind,
    Topic,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::commands::{AdminCommand, Command, HELP};
use crate::config::CliConfig;
use crate::render;

pub struct CliApp {
    handle: RuntimeHandle,
    economy: Arc<LedgerEconomy>,
    config: CliConfig,
    user: UserId,
    /// Users that already received their starting tickets.
    stocked: HashSet<UserId>,
    /// Message each user's current battle is bound to.
    messages: HashMap<UserId, MessageId>,
    next_message: u64,
}

impl CliApp {
    pub fn new(handle: RuntimeHandle, economy: Arc<LedgerEconomy>, config: CliConfig) -> Self {
        let user = config.user;
        Self {
            handle,
            economy,
            config,
            user,
            stocked: HashSet::new(),
            messages: HashMap::new(),
            next_message: 1,
        }
    }

    fn guild(&self) -> GuildId {
        self.config.guild
    }

    /// Load the guild's catalog and settings into an empty record store.
    ///
    /// A store that already holds items is left alone so admin edits made in
    /// earlier runs survive a restart.
    pub fn seed(&self) -> Result<()> {
        let guild = self.guild();
        if !self.handle.admin().items(guild)?.is_empty() {
            tracing::info!(%guild, "records already seeded");
            return Ok(());
        }

        let factory = ContentFactory::new(&self.config.content_dir);
        let catalog = factory.load_catalog(&guild.to_string())?;
        let settings = factory.load_settings(&guild.to_string())?;
        self.handle.admin().seed_catalog(guild, &catalog)?;
        self.handle.admin().apply_settings(guild, &settings)?;
        tracing::info!(
            %guild,
            items = catalog.items.len(),
            bosses = catalog.bosses.len(),
            "guild seeded from {}",
            factory.data_dir().display()
        );
        Ok(())
    }

    pub async fn run(mut self) -> Result<()> {
        let watcher = spawn_combat_watcher(self.handle.subscribe(Topic::Combat));

        println!("Gacha terminal. Guild {}, user {}. Type `help`.", self.guild(), self.user);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt(self.user)?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => command,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };

            self.stock_user().await;
            match self.execute(command).await {
                Ok(output) => println!("{output}"),
                Err(err) => print_error(&err),
            }
        }

        watcher.abort();
        Ok(())
    }

    async fn stock_user(&mut self) {
        if self.stocked.insert(self.user) {
            let count = self.config.starting_tickets;
            for kind in [TicketKind::Single, TicketKind::Ten] {
                self.economy
                    .grant_tickets(self.guild(), self.user, kind, count)
                    .await;
            }
        }
    }

    async fn execute(&mut self, command: Command) -> gacha_runtime::Result<String> {
        let guild = self.guild();
        let user = self.user;
        let handle = self.handle.clone();

        let output = match command {
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
            Command::Spin => match handle.draw(guild, user).await? {
                Some(result) => render::draw(&result),
                None => "The banner is empty.".to_string(),
            },
            Command::SpinTen => match handle.draw_ten(guild, user).await? {
                Some(result) => render::ten_draw(&result),
                None => "The banner is empty.".to_string(),
            },
            Command::Pity => render::pity(&handle.pity(guild, user)?),
            Command::Banner => render::banner(&handle.banner(guild)?),
            Command::Inventory => render::inventory(&handle.economy().inventory(guild, user)?),
            Command::Tokens => render::tokens(&handle.economy().tokens(guild, user)?),
            Command::Sell { item, quantity } => {
                let receipt = handle.economy().sell(guild, user, &item, quantity).await?;
                format!(
                    "Sold {} {} for {}. {} left.",
                    receipt.quantity, receipt.item, receipt.total, receipt.remaining
                )
            }
            Command::Exchanges => render::exchanges(&handle.economy().exchanges(guild)?),
            Command::Redeem { query } => {
                let receipt = handle.economy().redeem(guild, user, &query).await?;
                match receipt.unlock {
                    Some(marker) => format!(
                        "Redeemed {} and unlocked {marker}.",
                        receipt.exchange.reward_name
                    ),
                    None => format!("Redeemed {}.", receipt.exchange.reward_name),
                }
            }
            Command::Favorite { character: Some(query) } => {
                let name = handle.economy().set_favorite(guild, user, &query)?;
                format!("{name} is now your favorite.")
            }
            Command::Favorite { character: None } => {
                match handle.economy().favorite(guild, user)? {
                    Some(item) => format!("Favorite: {} [{}]", item.name, item.rarity),
                    None => "No favorite set.".to_string(),
                }
            }
            Command::Fight { boss, party } => {
                let party: Vec<&str> = party.iter().map(String::as_str).collect();
                let session = handle.start_session(guild, user, &boss, &party).await?;
                let message = MessageId(self.next_message);
                self.next_message += 1;
                handle.combat().bind_message(guild, user, message).await?;
                self.messages.insert(user, message);
                format!("Battle #{} begins!\n{}", session.id, render::battle(&session.battle))
            }
            Command::Act(action) => {
                let message = self.messages.get(&user).copied();
                let outcome = handle.submit_action(guild, user, message, action).await?;
                let mut out = render::turn(&outcome.report);
                match CombatOutcome::from_status(outcome.report.status) {
                    Some(ending) => {
                        self.messages.remove(&user);
                        out.push('\n');
                        out.push_str(&render::ending(ending, outcome.payout.as_ref()));
                    }
                    None => {
                        out.push('\n');
                        out.push_str(&render::battle(&outcome.session.battle));
                    }
                }
                out
            }
            Command::Status => match handle.combat().session(guild, user).await? {
                Some(session) => render::battle(&session.battle),
                None => "You are not in a battle.".to_string(),
            },
            Command::Switch { user } => {
                self.user = user;
                format!("Now acting as user {user}.")
            }
            Command::GrantTickets { kind, count } => {
                self.economy.grant_tickets(guild, user, kind, count).await;
                let total = self.economy.tickets(guild, user, kind).await;
                format!("You now hold {total} {kind} ticket(s).")
            }
            Command::Admin(admin) => self.execute_admin(user, admin)?,
        };
        Ok(output)
    }

    fn execute_admin(&self, user: UserId, command: AdminCommand) -> gacha_runtime::Result<String> {
        let guild = self.guild();
        let admin = self.handle.admin();
        let awaiting = |what: &str| {
            format!(
                "About to {what}. Type `confirm` within {}s or `cancel`.",
                admin.confirm_timeout().as_secs()
            )
        };

        let output = match command {
            AdminCommand::ItemAdd {
                name,
                weight,
                rarity,
                secret,
            } => {
                let item = if secret {
                    admin.create_secret_item(guild, &name, weight, rarity)?
                } else {
                    admin.create_item(guild, &name, weight, rarity)?
                };
                format!("Added {} [{}] with weight {}.", item.name, item.rarity, item.weight)
            }
            AdminCommand::ItemEdit { name, field, value } => {
                let item = admin.edit_item(guild, &name, field, &value)?;
                format!("Updated {} ({field}).", item.name)
            }
            AdminCommand::ItemDelete { name } => {
                let item = admin.request_delete_item(guild, user, &name)?;
                awaiting(&format!("delete {item}"))
            }
            AdminCommand::BossAdd { name } => {
                format!("Added boss {}.", admin.create_boss(guild, &name)?.name)
            }
            AdminCommand::BossEdit { name, field, value } => {
                let boss = admin.edit_boss(guild, &name, field, &value)?;
                format!("Updated {} ({field}).", boss.name)
            }
            AdminCommand::BossDelete { name } => {
                format!("Deleted boss {}.", admin.delete_boss(guild, &name)?.name)
            }
            AdminCommand::SkillAdd {
                name,
                element,
                damage,
                cost,
            } => {
                let mut skill = CommonSkill::new(name, element);
                skill.damage = damage;
                skill.cost = cost;
                let skill = admin.create_skill(guild, skill)?;
                format!("Added skill {} [{}].", skill.name, skill.element)
            }
            AdminCommand::SkillDelete { name } => {
                format!("Deleted skill {}.", admin.delete_skill(guild, &name)?.name)
            }
            AdminCommand::ExchangeAdd { reward } => {
                let exchange = admin.create_exchange(guild, &reward)?;
                format!("Exchange #{} for {} created.", exchange.id, exchange.reward_name)
            }
            AdminCommand::ExchangePrice { id, rarity, amount } => {
                render::exchanges(&[admin.set_exchange_price(guild, &id, rarity, amount)?])
            }
            AdminCommand::ExchangeMarker { id, marker } => {
                let exchange = admin.set_exchange_marker(guild, &id, marker.as_deref())?;
                match exchange.unlock_marker {
                    Some(marker) => format!("Exchange #{} unlocks {marker}.", exchange.id),
                    None => format!("Exchange #{} unlocks nothing.", exchange.id),
                }
            }
            AdminCommand::AdjustTokens {
                user,
                rarity,
                delta,
            } => {
                let amount = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
                let balance = if delta >= 0 {
                    admin.add_tokens(guild, user, rarity, amount)?
                } else {
                    admin.remove_tokens(guild, user, rarity, amount)?
                };
                format!("User {user} now holds {balance} {}.", rarity.token_name())
            }
            AdminCommand::PityMax(value) => {
                format!("Pity now guarantees an SSR every {} draws.", admin.set_pity_max(guild, value)?)
            }
            AdminCommand::BossBias(percent) => {
                format!(
                    "Bosses now use skills {}% of the time.",
                    admin.set_boss_skill_bias(guild, percent)?
                )
            }
            AdminCommand::ResetItems => {
                admin.request_reset_items(guild, user)?;
                awaiting("clear every item and collection")
            }
            AdminCommand::ResetTokens => {
                admin.request_reset_tokens(guild, user)?;
                awaiting("clear every token balance")
            }
            AdminCommand::ResetExchanges => {
                admin.reset_exchanges(guild)?;
                "Exchanges cleared.".to_string()
            }
            AdminCommand::ResetCollectable { item } => {
                format!("Every copy of {} was forgotten.", admin.reset_collectable(guild, &item)?)
            }
            AdminCommand::Confirm => render::confirmed(&admin.confirm(guild, user)?),
            AdminCommand::Cancel => format!("Cancelled: {}.", admin.cancel(guild, user)?),
        };
        Ok(output)
    }
}

fn prompt(user: UserId) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "[{user}]> ")?;
    stdout.flush()
}

fn print_error(err: &RuntimeError) {
    tracing::debug!(code = err.error_code(), severity = ?err.severity(), "command failed: {err}");
    println!("error [{}]: {err}", err.error_code());
}

/// Print battles that end without a player action.
fn spawn_combat_watcher(
    mut events: tokio::sync::broadcast::Receiver<Event>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::Combat(CombatEvent::Ended {
                    user,
                    session,
                    outcome: outcome @ (CombatOutcome::Timeout | CombatOutcome::Evicted),
                    ..
                })) => {
                    println!("\n[battle #{session} of user {user}] {}", render::ending(outcome, None));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "combat watcher lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
