//! Line-oriented command parsing.
//!
//! Arguments are whitespace separated; wrap names containing spaces in
//! double quotes (`fight "Stone Golem" Aria`).

use std::str::FromStr;

use gacha_core::{ElementalType, PlayerAction, Rarity, UserId};
use gacha_runtime::{BossField, ItemField, TicketKind};
use thiserror::Error;

pub const HELP: &str = "\
player:
  spin | spin10 | pity | banner | inventory | tokens
  sell <item> [quantity] | exchanges | redeem <id|name>
  favorite [character]
  fight <boss> <character>... | attack | skill | defend | forfeit | status
terminal:
  as <user id> | tickets <single|ten> <count> | help | quit
admin:
  item add <name> <weight> <rarity> [secret]
  item edit <name> <field> <value> | item delete <name>
  boss add <name> | boss edit <name> <field> <value> | boss delete <name>
  skill add <name> <element> <damage> [cost] | skill delete <name>
  exchange add <reward> | exchange price <id> <rarity> <amount>
  exchange marker <id> [marker]
  tokens <user id> <rarity> <+n|-n>
  pity-max <n> | boss-bias <percent>
  reset items|tokens|exchanges | reset collectable <item>
  confirm | cancel   (item delete, reset items and reset tokens wait for one)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`, try `help`")]
    UnknownCommand(String),

    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),

    #[error("invalid {name}: `{value}`")]
    InvalidArgument { name: &'static str, value: String },

    #[error("unterminated quote")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Spin,
    SpinTen,
    Pity,
    Banner,
    Inventory,
    Tokens,
    Sell { item: String, quantity: u32 },
    Exchanges,
    Redeem { query: String },
    Favorite { character: Option<String> },
    Fight { boss: String, party: Vec<String> },
    Act(PlayerAction),
    Status,
    Switch { user: UserId },
    GrantTickets { kind: TicketKind, count: u32 },
    Admin(AdminCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    ItemAdd {
        name: String,
        weight: u32,
        rarity: Rarity,
        secret: bool,
    },
    ItemEdit {
        name: String,
        field: ItemField,
        value: String,
    },
    ItemDelete { name: String },
    BossAdd { name: String },
    BossEdit {
        name: String,
        field: BossField,
        value: String,
    },
    BossDelete { name: String },
    SkillAdd {
        name: String,
        element: ElementalType,
        damage: u32,
        cost: u32,
    },
    SkillDelete { name: String },
    ExchangeAdd { reward: String },
    ExchangePrice {
        id: String,
        rarity: Rarity,
        amount: u32,
    },
    ExchangeMarker { id: String, marker: Option<String> },
    AdjustTokens {
        user: UserId,
        rarity: Rarity,
        delta: i64,
    },
    PityMax(u32),
    BossBias(u32),
    ResetItems,
    ResetTokens,
    ResetExchanges,
    ResetCollectable { item: String },
    Confirm,
    Cancel,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(line)?;
        let mut args = Args::new(&tokens);
        let verb = args.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();

        let command = match verb.as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "spin" => Command::Spin,
            "spin10" => Command::SpinTen,
            "pity" => Command::Pity,
            "banner" => Command::Banner,
            "inventory" | "inv" => Command::Inventory,
            "tokens" if args.remaining() == 0 => Command::Tokens,
            "sell" => Command::Sell {
                item: args.required("item")?,
                quantity: args.optional("quantity")?.unwrap_or(1),
            },
            "exchanges" => Command::Exchanges,
            "redeem" => Command::Redeem {
                query: args.required("id|name")?,
            },
            "favorite" | "fav" => Command::Favorite {
                character: args.next().map(str::to_string),
            },
            "fight" => {
                let boss = args.required("boss")?;
                let party: Vec<String> = args.rest();
                if party.is_empty() {
                    return Err(ParseError::MissingArgument("character"));
                }
                Command::Fight { boss, party }
            }
            "attack" => Command::Act(PlayerAction::Attack),
            "skill" => Command::Act(PlayerAction::UseSkill),
            "defend" => Command::Act(PlayerAction::Defend),
            "forfeit" => Command::Act(PlayerAction::Forfeit),
            "status" => Command::Status,
            "as" => Command::Switch {
                user: args.parsed("user id")?,
            },
            "tickets" => Command::GrantTickets {
                kind: match args.required("single|ten")?.to_ascii_lowercase().as_str() {
                    "single" | "1" => TicketKind::Single,
                    "ten" | "10" => TicketKind::Ten,
                    other => {
                        return Err(ParseError::InvalidArgument {
                            name: "ticket kind",
                            value: other.to_string(),
                        });
                    }
                },
                count: args.parsed("count")?,
            },
            _ => Command::Admin(parse_admin(&verb, &mut args)?),
        };

        Ok(command)
    }
}

fn parse_admin(verb: &str, args: &mut Args<'_>) -> Result<AdminCommand, ParseError> {
    let unknown = || ParseError::UnknownCommand(verb.to_string());
    let command = match verb {
        "item" => match args.required("add|edit|delete")?.as_str() {
            "add" => AdminCommand::ItemAdd {
                name: args.required("name")?,
                weight: args.parsed("weight")?,
                rarity: args.parsed("rarity")?,
                secret: args
                    .next()
                    .is_some_and(|flag| flag.eq_ignore_ascii_case("secret")),
            },
            "edit" => AdminCommand::ItemEdit {
                name: args.required("name")?,
                field: args.parsed("field")?,
                value: args.required("value")?,
            },
            "delete" => AdminCommand::ItemDelete {
                name: args.required("name")?,
            },
            _ => return Err(unknown()),
        },
        "boss" => match args.required("add|edit|delete")?.as_str() {
            "add" => AdminCommand::BossAdd {
                name: args.required("name")?,
            },
            "edit" => AdminCommand::BossEdit {
                name: args.required("name")?,
                field: args.parsed("field")?,
                value: args.required("value")?,
            },
            "delete" => AdminCommand::BossDelete {
                name: args.required("name")?,
            },
            _ => return Err(unknown()),
        },
        "skill" => match args.required("add|delete")?.as_str() {
            "add" => AdminCommand::SkillAdd {
                name: args.required("name")?,
                element: args.parsed("element")?,
                damage: args.parsed("damage")?,
                cost: args.optional("cost")?.unwrap_or(0),
            },
            "delete" => AdminCommand::SkillDelete {
                name: args.required("name")?,
            },
            _ => return Err(unknown()),
        },
        "exchange" => match args.required("add|price|marker")?.as_str() {
            "add" => AdminCommand::ExchangeAdd {
                reward: args.required("reward")?,
            },
            "price" => AdminCommand::ExchangePrice {
                id: args.required("id")?,
                rarity: args.parsed("rarity")?,
                amount: args.parsed("amount")?,
            },
            "marker" => AdminCommand::ExchangeMarker {
                id: args.required("id")?,
                marker: args.next().map(str::to_string),
            },
            _ => return Err(unknown()),
        },
        "tokens" => AdminCommand::AdjustTokens {
            user: args.parsed("user id")?,
            rarity: args.parsed("rarity")?,
            delta: args.parsed("amount")?,
        },
        "pity-max" => AdminCommand::PityMax(args.parsed("n")?),
        "boss-bias" => AdminCommand::BossBias(args.parsed("percent")?),
        "reset" => match args.required("what")?.to_ascii_lowercase().as_str() {
            "items" => AdminCommand::ResetItems,
            "tokens" => AdminCommand::ResetTokens,
            "exchanges" => AdminCommand::ResetExchanges,
            "collectable" => AdminCommand::ResetCollectable {
                item: args.required("item")?,
            },
            _ => return Err(unknown()),
        },
        "confirm" => AdminCommand::Confirm,
        "cancel" => AdminCommand::Cancel,
        _ => return Err(unknown()),
    };
    Ok(command)
}

struct Args<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Args<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    fn rest(&mut self) -> Vec<String> {
        let rest = self.tokens[self.pos.min(self.tokens.len())..].to_vec();
        self.pos = self.tokens.len();
        rest
    }

    fn required(&mut self, name: &'static str) -> Result<String, ParseError> {
        self.next()
            .map(str::to_string)
            .ok_or(ParseError::MissingArgument(name))
    }

    fn parsed<T: FromStr>(&mut self, name: &'static str) -> Result<T, ParseError> {
        let raw = self.next().ok_or(ParseError::MissingArgument(name))?;
        parse_value(name, raw)
    }

    fn optional<T: FromStr>(&mut self, name: &'static str) -> Result<Option<T>, ParseError> {
        self.next().map(|raw| parse_value(name, raw)).transpose()
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ParseError> {
    // `+5` is accepted for signed amounts.
    raw.trim_start_matches('+')
        .parse()
        .map_err(|_| ParseError::InvalidArgument {
            name,
            value: raw.to_string(),
        })
}

/// Splits on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}
