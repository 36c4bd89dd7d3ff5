//! Plain-text rendering of runtime results.

use std::fmt::Write;

use gacha_core::{
    ActionRecord, Banner, Battle, Claim, DrawOutcome, Exchange, Move, TokenWallet, TurnReport,
};
use gacha_runtime::{
    CombatOutcome, ConfirmedOperation, DrawResult, InventoryEntry, PayoutStatus, PityView,
    TenDrawResult,
};

pub fn draw(result: &DrawResult) -> String {
    let mut out = outcome_line(&result.outcome);
    push_claim(&mut out, &result.claim);
    if let Some(reply) = &result.reply {
        let _ = write!(out, "\n  \"{reply}\"");
    }
    out
}

pub fn ten_draw(result: &TenDrawResult) -> String {
    let headline = result.batch.headline();
    let mut out = format!("Headline: {}", outcome_line(headline));
    for group in &result.batch.groups {
        let _ = write!(out, "\n  {} [{}] x{}", group.name, group.rarity, group.count);
    }
    let tokens: u32 = result.claims.iter().filter(|c| c.token.is_some()).count() as u32;
    if tokens > 0 {
        let _ = write!(out, "\n  +{tokens} token(s)");
    }
    for marker in result.claims.iter().filter_map(|c| c.unlock.as_deref()) {
        let _ = write!(out, "\n  unlocked {marker}");
    }
    out
}

fn outcome_line(outcome: &DrawOutcome) -> String {
    let item = &outcome.item;
    let mut line = format!("{} [{}]", item.name, item.rarity);
    if item.promotional {
        line.push_str(" (promo)");
    }
    if outcome.forced {
        line.push_str(" - pity");
    }
    if let Some(count) = outcome.collectable_count {
        let _ = write!(line, " - you own {count}");
    }
    line
}

fn push_claim(out: &mut String, claim: &Claim) {
    if let Some(rarity) = claim.token {
        let label = if claim.duplicate { "duplicate, " } else { "" };
        let _ = write!(out, "\n  {label}+1 {}", rarity.token_name());
    }
    if let Some(marker) = &claim.unlock {
        let _ = write!(out, "\n  unlocked {marker}");
    }
}

pub fn pity(view: &PityView) -> String {
    let guarantee = if view.state.guaranteed_promotional {
        "next SSR is promotional"
    } else {
        "50/50 on the next SSR"
    };
    format!(
        "Pity {}/{}: SSR guaranteed within {} draw(s), {}. Total spins: {}",
        view.state.counter, view.pity_max, view.draws_until_guarantee, guarantee, view.total_spins
    )
}

pub fn banner(banner: &Banner) -> String {
    if banner.is_empty() {
        return "The banner is empty.".to_string();
    }
    let mut out = String::new();
    for share in &banner.rarities {
        let _ = write!(out, "{} {:.2}%  ", share.rarity, share.percent);
    }
    for entry in &banner.entries {
        let promo = if entry.promotional { " *" } else { "" };
        let _ = write!(
            out,
            "\n  [{}] {}{} {:.2}%",
            entry.rarity, entry.name, promo, entry.percent
        );
    }
    out
}

pub fn inventory(entries: &[InventoryEntry]) -> String {
    if entries.is_empty() {
        return "Your inventory is empty.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let price = if entry.price > 0 {
                format!(" - sells for {}", entry.price)
            } else {
                String::new()
            };
            format!(
                "{} [{}] {} x{}{}",
                entry.name, entry.rarity, entry.kind, entry.count, price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn tokens(wallet: &TokenWallet) -> String {
    let balances: Vec<String> = wallet
        .iter()
        .map(|(rarity, amount)| format!("{}: {amount}", rarity.token_name()))
        .collect();
    if balances.is_empty() {
        "No tokens.".to_string()
    } else {
        balances.join(", ")
    }
}

pub fn exchanges(exchanges: &[Exchange]) -> String {
    if exchanges.is_empty() {
        return "No exchanges configured.".to_string();
    }
    exchanges
        .iter()
        .map(|exchange| {
            let prices: Vec<String> = exchange
                .prices
                .iter()
                .map(|(rarity, amount)| format!("{amount} {}", rarity.token_name()))
                .collect();
            format!(
                "#{} {} - {}",
                exchange.id,
                exchange.reward_name,
                if prices.is_empty() {
                    "not for sale".to_string()
                } else {
                    prices.join(" + ")
                }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn battle(battle: &Battle) -> String {
    let boss = battle.boss();
    let mut out = format!(
        "Turn {} - {} [{}] HP {}/{}",
        battle.turn() + 1,
        boss.name(),
        boss.profile.element,
        boss.hp,
        boss.profile.stats.hp
    );
    for (idx, fighter) in battle.party().iter().enumerate() {
        let marker = if idx == battle.current_index() { ">" } else { " " };
        let _ = write!(
            out,
            "\n {marker} {} [{}] HP {}/{} SP {}/{}",
            fighter.name, fighter.element, fighter.hp, fighter.stats.hp, fighter.sp, fighter.stats.sp
        );
    }
    out
}

pub fn turn(report: &TurnReport) -> String {
    let mut out = action_line(&report.player);
    if let Some(boss) = &report.boss {
        let _ = write!(out, "\n{}", action_line(boss));
    }
    if let Some(name) = &report.knocked_out {
        let _ = write!(out, "\n{name} is knocked out!");
    }
    if let Some(name) = &report.next_character {
        let _ = write!(out, "\n{name} steps in.");
    }
    if report.sp_regenerated > 0 {
        let _ = write!(out, "\n+{} SP", report.sp_regenerated);
    }
    out
}

fn action_line(record: &ActionRecord) -> String {
    let mut line = match &record.action {
        Move::Attack => format!("{} attacks", record.actor),
        Move::Skill(name) => format!("{} uses {name} [{}]", record.actor, record.element),
        Move::Defend => format!("{} defends", record.actor),
        Move::Forfeit => format!("{} forfeits", record.actor),
    };
    if record.reflected {
        let _ = write!(line, " - reflected for {} damage", record.reflected_damage);
    } else if record.damage > 0 {
        let _ = write!(line, " for {} damage", record.damage);
    }
    if record.healed > 0 {
        let _ = write!(line, ", heals {}", record.healed);
    }
    if let Some(effect) = record.effect {
        let _ = write!(line, " ({effect})");
    }
    line
}

pub fn ending(outcome: CombatOutcome, payout: Option<&PayoutStatus>) -> String {
    let mut out = match outcome {
        CombatOutcome::Victory => "Victory!".to_string(),
        CombatOutcome::Defeat => "Your party was defeated.".to_string(),
        CombatOutcome::Forfeit => "You forfeited the battle.".to_string(),
        CombatOutcome::Timeout => "The battle timed out.".to_string(),
        CombatOutcome::Evicted => "The battle was closed for inactivity.".to_string(),
    };
    match payout {
        Some(PayoutStatus::Paid { amount }) => {
            let _ = write!(out, " Reward: {amount}.");
        }
        Some(PayoutStatus::Failed { amount, reason }) => {
            let _ = write!(out, " The reward of {amount} could not be paid: {reason}");
        }
        None => {}
    }
    out
}

pub fn confirmed(operation: &ConfirmedOperation) -> String {
    match operation {
        ConfirmedOperation::ItemDeleted(item) => format!("Deleted {}.", item.name),
        ConfirmedOperation::ItemsReset => "Items and collections cleared.".to_string(),
        ConfirmedOperation::TokensReset => "Token balances cleared.".to_string(),
    }
}
