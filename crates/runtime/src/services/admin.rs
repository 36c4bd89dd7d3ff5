//! Guild administration: catalog CRUD, tuning and token grants.
//!
//! Every edit validates its input before the stored record is touched, so a
//! rejected command leaves the guild exactly as it was.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use gacha_content::{Catalog, GuildSettings};
use gacha_core::{
    Boss, BossSkill, Collection, CombatProfile, CommonSkill, DEFAULT_COMBAT_STATS, Difficulty,
    ElementalType, Exchange, GuildId, ObjectKind, Rarity, RewardItem, StatKind, TokenWallet,
    UserId, ValidationError, position_by_name, validation,
};

use crate::api::{Result, RuntimeError};
use crate::repository::{ConfigKey, GuildRecords, RecordKind, RepositoryError};
use crate::services::confirm::{Confirmations, ConfirmedOperation, PendingOperation};

/// Editable reward-item fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum ItemField {
    Name,
    #[strum(to_string = "weight", serialize = "chance")]
    Weight,
    Rarity,
    #[strum(to_string = "promotional", serialize = "promo")]
    Promotional,
    Secret,
    #[strum(to_string = "kind", serialize = "type")]
    Kind,
    Collectable,
    GiveTokens,
    #[strum(to_string = "unlock", serialize = "role")]
    Unlock,
    Price,
    Reply,
    #[strum(to_string = "collectable_reply1", serialize = "replycollectable1")]
    CollectableReply1,
    #[strum(to_string = "collectable_reply2", serialize = "replycollectable2")]
    CollectableReply2,
    #[strum(to_string = "collectable_reply3", serialize = "replycollectable3")]
    CollectableReply3,
    Hp,
    Atk,
    Def,
    Spd,
    Sp,
    Element,
    Weaknesses,
    Resistances,
    Reflects,
    Equip,
    Unequip,
}

/// Editable boss fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum BossField {
    Name,
    Hp,
    Atk,
    Def,
    Spd,
    Sp,
    Element,
    Weaknesses,
    Resistances,
    Reflects,
    Reward,
    Difficulty,
}

fn stat_of(field: &str) -> Option<StatKind> {
    field.parse().ok()
}

/// Admin operations for one runtime.
#[derive(Clone)]
pub struct AdminService {
    records: GuildRecords,
    /// Serializes read-modify-write cycles on catalog documents.
    catalog: Arc<Mutex<()>>,
    confirmations: Confirmations,
}

impl AdminService {
    pub fn new(records: GuildRecords) -> Self {
        Self {
            records,
            catalog: Arc::default(),
            confirmations: Confirmations::default(),
        }
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirmations = Confirmations::new(timeout);
        self
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        Ok(self
            .catalog
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?)
    }

    // ========================================================================
    // Items
    // ========================================================================

    pub fn items(&self, guild: GuildId) -> Result<Vec<RewardItem>> {
        Ok(self.records.list(guild, RecordKind::Items)?)
    }

    pub fn create_item(
        &self,
        guild: GuildId,
        name: &str,
        weight: u32,
        rarity: Rarity,
    ) -> Result<RewardItem> {
        self.insert_item(guild, name, weight, rarity, false)
    }

    /// Same as [`Self::create_item`] but hidden from the banner.
    pub fn create_secret_item(
        &self,
        guild: GuildId,
        name: &str,
        weight: u32,
        rarity: Rarity,
    ) -> Result<RewardItem> {
        self.insert_item(guild, name, weight, rarity, true)
    }

    fn insert_item(
        &self,
        guild: GuildId,
        name: &str,
        weight: u32,
        rarity: Rarity,
        secret: bool,
    ) -> Result<RewardItem> {
        let _guard = self.guard()?;
        let mut items = self.items(guild)?;
        let name = validation::name(name)?;
        ensure_unique("item", items.iter().map(|i| i.name.as_str()), &name)?;

        let item = RewardItem::new(name, validation::weight(weight)?, rarity).secret(secret);
        items.push(item.clone());
        self.records.save_list(guild, RecordKind::Items, &items)?;
        tracing::info!(%guild, item = %item.name, %rarity, secret, "item created");
        Ok(item)
    }

    /// Set one field of an item. A rename carries every user's copies and
    /// favorites over to the new name.
    pub fn edit_item(
        &self,
        guild: GuildId,
        query: &str,
        field: ItemField,
        value: &str,
    ) -> Result<RewardItem> {
        let _guard = self.guard()?;
        let mut items = self.items(guild)?;
        let idx = locate(&items, query, "item")?;
        let mut item = items[idx].clone();
        let previous_name = item.name.clone();

        match field {
            ItemField::Name => {
                let name = validation::name(value)?;
                let others = items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, other)| other.name.as_str());
                ensure_unique("item", others, &name)?;
                item.name = name;
            }
            ItemField::Weight => {
                item.weight = validation::weight(validation::parse("weight", value)?)?;
            }
            ItemField::Rarity => {
                item.rarity = value
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::UnknownRarity(value.to_string()))?;
            }
            ItemField::Promotional => item.promotional = parse_flag("promotional", value)?,
            ItemField::Secret => item.secret = parse_flag("secret", value)?,
            ItemField::Kind => {
                item.kind = value
                    .trim()
                    .parse::<ObjectKind>()
                    .map_err(|_| ValidationError::UnknownObjectKind(value.to_string()))?;
            }
            ItemField::Collectable => {
                item.set_collectable_threshold(validation::parse("collectable", value)?);
            }
            ItemField::GiveTokens => item.give_tokens = parse_flag("give_tokens", value)?,
            ItemField::Unlock => item.unlock_marker = optional_text(value),
            ItemField::Price => item.price = validation::parse("price", value)?,
            ItemField::Reply => item.reply = optional_text(value),
            ItemField::CollectableReply1 => item.set_collectable_reply(1, optional_text(value))?,
            ItemField::CollectableReply2 => item.set_collectable_reply(2, optional_text(value))?,
            ItemField::CollectableReply3 => item.set_collectable_reply(3, optional_text(value))?,
            ItemField::Hp | ItemField::Atk | ItemField::Def | ItemField::Spd | ItemField::Sp => {
                let kind = stat_of(&field.to_string())
                    .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
                combat_mut(&mut item)?
                    .stats
                    .set(kind, validation::parse("stat", value)?)?;
            }
            ItemField::Element => combat_mut(&mut item)?.element = parse_element(value)?,
            ItemField::Weaknesses => {
                combat_mut(&mut item)?.affinities.weaknesses = parse_elements(value)?;
            }
            ItemField::Resistances => {
                combat_mut(&mut item)?.affinities.resistances = parse_elements(value)?;
            }
            ItemField::Reflects => {
                combat_mut(&mut item)?.affinities.reflects = parse_reflects(value)?;
            }
            ItemField::Equip => {
                let skills: Vec<CommonSkill> = self.records.list(guild, RecordKind::CommonSkills)?;
                let skill = &skills[locate(&skills, value, "skill")?];
                combat_mut(&mut item)?.equip(&skill.name)?;
            }
            ItemField::Unequip => {
                let removed = item
                    .combat
                    .as_mut()
                    .is_some_and(|profile| profile.unequip(value.trim()));
                if !removed {
                    return Err(ValidationError::NotFound {
                        kind: "equipped skill",
                        name: value.to_string(),
                    }
                    .into());
                }
            }
        }

        item.validate()?;
        items[idx] = item.clone();
        self.records.save_list(guild, RecordKind::Items, &items)?;

        if item.name != previous_name {
            self.rename_references(guild, &previous_name, &item.name)?;
        }
        tracing::info!(%guild, item = %item.name, %field, "item edited");
        Ok(item)
    }

    /// Remove one item. Users keep their counters for it.
    pub fn delete_item(&self, guild: GuildId, query: &str) -> Result<RewardItem> {
        let _guard = self.guard()?;
        let mut items = self.items(guild)?;
        let idx = locate(&items, query, "item")?;
        let removed = items.remove(idx);
        self.records.save_list(guild, RecordKind::Items, &items)?;
        tracing::info!(%guild, item = %removed.name, "item deleted");
        Ok(removed)
    }

    /// Drop every item and every user's collectable counters.
    pub fn reset_items(&self, guild: GuildId) -> Result<()> {
        let _guard = self.guard()?;
        self.records
            .save_list::<RewardItem>(guild, RecordKind::Items, &[])?;
        self.records.reset(guild, RecordKind::Collectables)?;
        tracing::info!(%guild, "items reset");
        Ok(())
    }

    /// Forget one item's counter for every user.
    pub fn reset_collectable(&self, guild: GuildId, query: &str) -> Result<String> {
        let _guard = self.guard()?;
        let items = self.items(guild)?;
        let name = items[locate(&items, query, "item")?].name.clone();

        self.records.update_users(
            guild,
            RecordKind::Collectables,
            |collections: &mut BTreeMap<String, Collection>| -> Result<()> {
                for collection in collections.values_mut() {
                    collection.forget(&name);
                }
                Ok(())
            },
        )?;
        Ok(name)
    }

    fn rename_references(&self, guild: GuildId, from: &str, to: &str) -> Result<()> {
        self.records.update_users(
            guild,
            RecordKind::Collectables,
            |collections: &mut BTreeMap<String, Collection>| -> Result<()> {
                for collection in collections.values_mut() {
                    collection.rename(from, to);
                }
                Ok(())
            },
        )?;
        self.records.update_users(
            guild,
            RecordKind::Favorites,
            |favorites: &mut BTreeMap<String, Option<String>>| -> Result<()> {
                for favorite in favorites.values_mut().flatten() {
                    if favorite.as_str() == from {
                        *favorite = to.to_string();
                    }
                }
                Ok(())
            },
        )
    }

    // ========================================================================
    // Tuning
    // ========================================================================

    pub fn set_pity_max(&self, guild: GuildId, value: u32) -> Result<u32> {
        let value = validation::pity_max(value)?;
        self.records.set_config(guild, ConfigKey::PityMax, &value)?;
        tracing::info!(%guild, pity_max = value, "pity updated");
        Ok(value)
    }

    pub fn set_boss_skill_bias(&self, guild: GuildId, percent: u32) -> Result<u8> {
        let percent = validation::at_most("boss_skill_bias_percent", percent, 100)? as u8;
        self.records
            .set_config(guild, ConfigKey::BossSkillBiasPercent, &percent)?;
        Ok(percent)
    }

    pub fn apply_settings(&self, guild: GuildId, settings: &GuildSettings) -> Result<()> {
        settings.validate()?;
        self.records
            .set_config(guild, ConfigKey::PityMax, &settings.pity_max)?;
        self.records.set_config(
            guild,
            ConfigKey::BossSkillBiasPercent,
            &settings.boss_skill_bias_percent,
        )?;
        Ok(())
    }

    // ========================================================================
    // Bosses
    // ========================================================================

    pub fn bosses(&self, guild: GuildId) -> Result<Vec<Boss>> {
        Ok(self.records.list(guild, RecordKind::Bosses)?)
    }

    /// New boss with default stats and a neutral type.
    pub fn create_boss(&self, guild: GuildId, name: &str) -> Result<Boss> {
        let _guard = self.guard()?;
        let mut bosses = self.bosses(guild)?;
        let name = validation::name(name)?;
        ensure_unique("boss", bosses.iter().map(|b| b.name.as_str()), &name)?;

        let boss = Boss::new(name, DEFAULT_COMBAT_STATS, ElementalType::Neutral);
        bosses.push(boss.clone());
        self.records.save_list(guild, RecordKind::Bosses, &bosses)?;
        tracing::info!(%guild, boss = %boss.name, "boss created");
        Ok(boss)
    }

    pub fn edit_boss(
        &self,
        guild: GuildId,
        query: &str,
        field: BossField,
        value: &str,
    ) -> Result<Boss> {
        let _guard = self.guard()?;
        let mut bosses = self.bosses(guild)?;
        let idx = locate(&bosses, query, "boss")?;
        let mut boss = bosses[idx].clone();

        match field {
            BossField::Name => {
                let name = validation::name(value)?;
                let others = bosses
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, other)| other.name.as_str());
                ensure_unique("boss", others, &name)?;
                boss.name = name;
            }
            BossField::Hp | BossField::Atk | BossField::Def | BossField::Spd | BossField::Sp => {
                let kind = stat_of(&field.to_string())
                    .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
                boss.stats.set(kind, validation::parse("stat", value)?)?;
            }
            BossField::Element => boss.element = parse_element(value)?,
            BossField::Weaknesses => boss.affinities.weaknesses = parse_elements(value)?,
            BossField::Resistances => boss.affinities.resistances = parse_elements(value)?,
            BossField::Reflects => boss.affinities.reflects = parse_reflects(value)?,
            BossField::Reward => boss.reward = validation::parse("reward", value)?,
            BossField::Difficulty => {
                boss.difficulty = validation::parse::<Difficulty>("difficulty", value)?;
            }
        }

        boss.validate()?;
        bosses[idx] = boss.clone();
        self.records.save_list(guild, RecordKind::Bosses, &bosses)?;
        tracing::info!(%guild, boss = %boss.name, %field, "boss edited");
        Ok(boss)
    }

    pub fn add_boss_skill(&self, guild: GuildId, query: &str, skill: BossSkill) -> Result<Boss> {
        let _guard = self.guard()?;
        let mut bosses = self.bosses(guild)?;
        let idx = locate(&bosses, query, "boss")?;
        let mut skill = skill;
        skill.name = validation::name(&skill.name)?;
        bosses[idx].add_skill(skill)?;
        self.records.save_list(guild, RecordKind::Bosses, &bosses)?;
        Ok(bosses[idx].clone())
    }

    pub fn remove_boss_skill(&self, guild: GuildId, query: &str, skill: &str) -> Result<Boss> {
        let _guard = self.guard()?;
        let mut bosses = self.bosses(guild)?;
        let idx = locate(&bosses, query, "boss")?;
        if !bosses[idx].remove_skill(skill.trim()) {
            return Err(ValidationError::NotFound {
                kind: "boss skill",
                name: skill.to_string(),
            }
            .into());
        }
        self.records.save_list(guild, RecordKind::Bosses, &bosses)?;
        Ok(bosses[idx].clone())
    }

    pub fn delete_boss(&self, guild: GuildId, query: &str) -> Result<Boss> {
        let _guard = self.guard()?;
        let mut bosses = self.bosses(guild)?;
        let removed = bosses.remove(locate(&bosses, query, "boss")?);
        self.records.save_list(guild, RecordKind::Bosses, &bosses)?;
        tracing::info!(%guild, boss = %removed.name, "boss deleted");
        Ok(removed)
    }

    // ========================================================================
    // Common skills
    // ========================================================================

    pub fn skills(&self, guild: GuildId) -> Result<Vec<CommonSkill>> {
        Ok(self.records.list(guild, RecordKind::CommonSkills)?)
    }

    pub fn create_skill(&self, guild: GuildId, skill: CommonSkill) -> Result<CommonSkill> {
        let _guard = self.guard()?;
        let mut skills = self.skills(guild)?;
        let mut skill = skill;
        skill.name = validation::name(&skill.name)?;
        skill.validate()?;
        ensure_unique("skill", skills.iter().map(|s| s.name.as_str()), &skill.name)?;

        skills.push(skill.clone());
        self.records
            .save_list(guild, RecordKind::CommonSkills, &skills)?;
        tracing::info!(%guild, skill = %skill.name, "skill created");
        Ok(skill)
    }

    /// Delete a skill and unequip it from every character.
    pub fn delete_skill(&self, guild: GuildId, query: &str) -> Result<CommonSkill> {
        let _guard = self.guard()?;
        let mut skills = self.skills(guild)?;
        let removed = skills.remove(locate(&skills, query, "skill")?);
        self.records
            .save_list(guild, RecordKind::CommonSkills, &skills)?;

        let mut items = self.items(guild)?;
        let mut touched = false;
        for profile in items.iter_mut().filter_map(|item| item.combat.as_mut()) {
            touched |= profile.unequip(&removed.name);
        }
        if touched {
            self.records.save_list(guild, RecordKind::Items, &items)?;
        }
        Ok(removed)
    }

    // ========================================================================
    // Exchanges
    // ========================================================================

    /// New exchange with the next numeric id and no prices.
    pub fn create_exchange(&self, guild: GuildId, reward_name: &str) -> Result<Exchange> {
        let _guard = self.guard()?;
        let mut exchanges: Vec<Exchange> = self.records.list(guild, RecordKind::Exchanges)?;
        let exchange = Exchange {
            id: (exchanges.len() + 1).to_string(),
            reward_name: validation::name(reward_name)?,
            prices: BTreeMap::new(),
            unlock_marker: None,
        };
        exchanges.push(exchange.clone());
        self.records
            .save_list(guild, RecordKind::Exchanges, &exchanges)?;
        Ok(exchange)
    }

    /// Set one rarity's token price; 0 removes it.
    pub fn set_exchange_price(
        &self,
        guild: GuildId,
        id: &str,
        rarity: Rarity,
        amount: u32,
    ) -> Result<Exchange> {
        self.update_exchange(guild, id, |exchange| {
            if amount == 0 {
                exchange.prices.remove(&rarity);
            } else {
                exchange.prices.insert(rarity, amount);
            }
        })
    }

    pub fn set_exchange_marker(
        &self,
        guild: GuildId,
        id: &str,
        marker: Option<&str>,
    ) -> Result<Exchange> {
        let marker = marker.and_then(optional_text);
        self.update_exchange(guild, id, |exchange| exchange.unlock_marker = marker)
    }

    pub fn reset_exchanges(&self, guild: GuildId) -> Result<()> {
        let _guard = self.guard()?;
        self.records
            .save_list::<Exchange>(guild, RecordKind::Exchanges, &[])?;
        Ok(())
    }

    fn update_exchange(
        &self,
        guild: GuildId,
        id: &str,
        update: impl FnOnce(&mut Exchange),
    ) -> Result<Exchange> {
        let _guard = self.guard()?;
        let mut exchanges: Vec<Exchange> = self.records.list(guild, RecordKind::Exchanges)?;
        let exchange = exchanges
            .iter_mut()
            .find(|e| e.id == id.trim())
            .ok_or_else(|| ValidationError::NotFound {
                kind: "exchange",
                name: id.to_string(),
            })?;
        update(exchange);
        let updated = exchange.clone();
        self.records
            .save_list(guild, RecordKind::Exchanges, &exchanges)?;
        Ok(updated)
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub fn add_tokens(&self, guild: GuildId, user: UserId, rarity: Rarity, amount: u32) -> Result<u32> {
        self.records.update_user(
            guild,
            RecordKind::Tokens,
            user,
            |wallet: &mut TokenWallet| -> Result<u32> { Ok(wallet.add(rarity, amount)) },
        )
    }

    pub fn remove_tokens(
        &self,
        guild: GuildId,
        user: UserId,
        rarity: Rarity,
        amount: u32,
    ) -> Result<u32> {
        self.records.update_user(
            guild,
            RecordKind::Tokens,
            user,
            |wallet: &mut TokenWallet| -> Result<u32> { Ok(wallet.remove(rarity, amount)?) },
        )
    }

    /// Clear every user's token balances.
    pub fn reset_tokens(&self, guild: GuildId) -> Result<()> {
        self.records.reset(guild, RecordKind::Tokens)?;
        tracing::info!(%guild, "tokens reset");
        Ok(())
    }

    // ========================================================================
    // Confirmations
    // ========================================================================

    /// Stage deletion of the item `query` resolves to right now.
    pub fn request_delete_item(&self, guild: GuildId, admin: UserId, query: &str) -> Result<String> {
        let items = self.items(guild)?;
        let item = items[locate(&items, query, "item")?].name.clone();
        self.confirmations
            .request(guild, admin, PendingOperation::DeleteItem { item: item.clone() })?;
        Ok(item)
    }

    pub fn request_reset_items(&self, guild: GuildId, admin: UserId) -> Result<()> {
        Ok(self
            .confirmations
            .request(guild, admin, PendingOperation::ResetItems)?)
    }

    pub fn request_reset_tokens(&self, guild: GuildId, admin: UserId) -> Result<()> {
        Ok(self
            .confirmations
            .request(guild, admin, PendingOperation::ResetTokens)?)
    }

    pub fn confirm_timeout(&self) -> Duration {
        self.confirmations.timeout()
    }

    /// Carry out `admin`'s pending request.
    pub fn confirm(&self, guild: GuildId, admin: UserId) -> Result<ConfirmedOperation> {
        let operation = self
            .confirmations
            .take(guild, admin)?
            .ok_or(RuntimeError::NothingToConfirm)?;
        tracing::info!(%guild, %admin, %operation, "admin operation confirmed");

        Ok(match operation {
            PendingOperation::DeleteItem { item } => {
                ConfirmedOperation::ItemDeleted(self.delete_item(guild, &item)?)
            }
            PendingOperation::ResetItems => {
                self.reset_items(guild)?;
                ConfirmedOperation::ItemsReset
            }
            PendingOperation::ResetTokens => {
                self.reset_tokens(guild)?;
                ConfirmedOperation::TokensReset
            }
        })
    }

    /// Drop `admin`'s pending request without running it.
    pub fn cancel(&self, guild: GuildId, admin: UserId) -> Result<PendingOperation> {
        let operation = self
            .confirmations
            .take(guild, admin)?
            .ok_or(RuntimeError::NothingToConfirm)?;
        tracing::info!(%guild, %admin, %operation, "admin operation cancelled");
        Ok(operation)
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Replace the guild's catalog with a validated one.
    pub fn seed_catalog(&self, guild: GuildId, catalog: &Catalog) -> Result<()> {
        catalog.validate()?;
        let _guard = self.guard()?;
        self.records
            .save_list(guild, RecordKind::Items, &catalog.items)?;
        self.records
            .save_list(guild, RecordKind::Bosses, &catalog.bosses)?;
        self.records
            .save_list(guild, RecordKind::CommonSkills, &catalog.skills)?;
        self.records
            .save_list(guild, RecordKind::Exchanges, &catalog.exchanges)?;
        tracing::info!(
            %guild,
            items = catalog.items.len(),
            bosses = catalog.bosses.len(),
            skills = catalog.skills.len(),
            "catalog seeded"
        );
        Ok(())
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn locate<T: gacha_core::Named>(records: &[T], query: &str, kind: &'static str) -> Result<usize> {
    position_by_name(records, query).ok_or_else(|| {
        ValidationError::NotFound {
            kind,
            name: query.to_string(),
        }
        .into()
    })
}

fn ensure_unique<'a>(
    kind: &'static str,
    mut existing: impl Iterator<Item = &'a str>,
    name: &str,
) -> Result<(), ValidationError> {
    if existing.any(|other| other.eq_ignore_ascii_case(name)) {
        return Err(ValidationError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Character items gain a default combat block on their first combat edit.
fn combat_mut(item: &mut RewardItem) -> Result<&mut CombatProfile, ValidationError> {
    if item.kind != ObjectKind::Character {
        return Err(ValidationError::NotACharacter(item.name.clone()));
    }
    Ok(item.combat.get_or_insert_with(CombatProfile::default))
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ValidationError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

/// Empty or `none` clears the field.
fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && !value.eq_ignore_ascii_case("none")).then(|| value.to_string())
}

fn parse_element(value: &str) -> Result<ElementalType, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::UnknownElement(value.to_string()))
}

/// Comma-separated list of types; empty or `none` clears it.
fn parse_elements(value: &str) -> Result<BTreeSet<ElementalType>, ValidationError> {
    if optional_text(value).is_none() {
        return Ok(BTreeSet::new());
    }
    value.split(',').map(parse_element).collect()
}

/// `fire:50, water:0` style reflect map.
fn parse_reflects(value: &str) -> Result<BTreeMap<ElementalType, u8>, ValidationError> {
    if optional_text(value).is_none() {
        return Ok(BTreeMap::new());
    }
    value
        .split(',')
        .map(|entry| {
            let (element, percent) =
                entry
                    .split_once(':')
                    .ok_or_else(|| ValidationError::InvalidValue {
                        field: "reflects",
                        value: entry.trim().to_string(),
                    })?;
            let percent = validation::reflect_percent(validation::parse("reflects", percent)?)?;
            Ok((parse_element(element)?, percent))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId(7);

    fn admin() -> AdminService {
        AdminService::new(GuildRecords::in_memory())
    }

    #[test]
    fn duplicate_names_are_rejected_case_insensitively() {
        let admin = admin();
        admin.create_item(GUILD, "Aria", 5, Rarity::SSR).unwrap();
        let err = admin.create_item(GUILD, " aria ", 5, Rarity::R).unwrap_err();
        assert!(matches!(
            err,
            crate::api::RuntimeError::Validation(ValidationError::DuplicateName { .. })
        ));
        assert_eq!(admin.items(GUILD).unwrap().len(), 1);
    }

    #[test]
    fn invalid_edit_leaves_item_untouched() {
        let admin = admin();
        admin.create_item(GUILD, "Aria", 5, Rarity::SSR).unwrap();
        assert!(admin.edit_item(GUILD, "aria", ItemField::Atk, "1001").is_err());
        assert!(admin.edit_item(GUILD, "aria", ItemField::Weight, "0").is_err());
        assert!(admin.edit_item(GUILD, "aria", ItemField::Element, "plasma").is_err());
        assert!(admin.edit_item(GUILD, "aria", ItemField::Reflects, "fire:101").is_err());

        let item = &admin.items(GUILD).unwrap()[0];
        assert_eq!(item.weight, 5);
        assert!(item.combat.is_none());
    }

    #[test]
    fn combat_edits_create_a_profile() {
        let admin = admin();
        admin.create_item(GUILD, "Aria", 5, Rarity::SSR).unwrap();
        admin.edit_item(GUILD, "ari", ItemField::Atk, "150").unwrap();
        admin
            .edit_item(GUILD, "ari", ItemField::Reflects, "fire:50, water:0")
            .unwrap();
        let item = admin
            .edit_item(GUILD, "ari", ItemField::Weaknesses, "dark,ice")
            .unwrap();

        let profile = item.combat.unwrap();
        assert_eq!(profile.stats.atk, 150);
        assert_eq!(profile.stats.hp, DEFAULT_COMBAT_STATS.hp);
        assert_eq!(profile.affinities.reflect_percent(ElementalType::Water), Some(0));
        assert!(profile.affinities.weaknesses.contains(&ElementalType::Ice));
    }

    #[test]
    fn equip_requires_existing_skill_and_caps_at_three() {
        let admin = admin();
        admin.create_item(GUILD, "Aria", 5, Rarity::SSR).unwrap();
        assert!(admin.edit_item(GUILD, "aria", ItemField::Equip, "Flare").is_err());

        for name in ["Flare", "Frost", "Gale", "Quake"] {
            admin
                .create_skill(GUILD, CommonSkill::new(name, ElementalType::Neutral))
                .unwrap();
        }
        for name in ["flare", "frost", "gale"] {
            admin.edit_item(GUILD, "aria", ItemField::Equip, name).unwrap();
        }
        let err = admin
            .edit_item(GUILD, "aria", ItemField::Equip, "quake")
            .unwrap_err();
        assert!(matches!(
            err,
            crate::api::RuntimeError::Validation(ValidationError::TooManySkills { limit: 3 })
        ));

        admin.delete_skill(GUILD, "frost").unwrap();
        let skills = admin.items(GUILD).unwrap()[0].combat.clone().unwrap().skills;
        assert_eq!(skills.as_slice(), ["Flare".to_string(), "Gale".to_string()]);
    }

    #[test]
    fn rename_moves_collectable_counters() {
        let records = GuildRecords::in_memory();
        let admin = AdminService::new(records.clone());
        admin.create_item(GUILD, "Coin", 5, Rarity::R).unwrap();
        let mut collection = Collection::default();
        collection.increment("Coin");
        records
            .save_user(GUILD, RecordKind::Collectables, UserId(1), &collection)
            .unwrap();

        admin.edit_item(GUILD, "coin", ItemField::Name, "Gold Coin").unwrap();
        let moved: Collection = records
            .user(GUILD, RecordKind::Collectables, UserId(1))
            .unwrap();
        assert_eq!(moved.count("Gold Coin"), 1);
        assert_eq!(moved.count("Coin"), 0);
    }

    #[test]
    fn reset_items_cascades_but_delete_does_not() {
        let records = GuildRecords::in_memory();
        let admin = AdminService::new(records.clone());
        admin.create_item(GUILD, "Coin", 5, Rarity::R).unwrap();
        admin.create_item(GUILD, "Gem", 5, Rarity::R).unwrap();
        let mut collection = Collection::default();
        collection.increment("Coin");
        records
            .save_user(GUILD, RecordKind::Collectables, UserId(1), &collection)
            .unwrap();

        admin.delete_item(GUILD, "coin").unwrap();
        let kept: Collection = records.user(GUILD, RecordKind::Collectables, UserId(1)).unwrap();
        assert_eq!(kept.count("Coin"), 1);

        admin.reset_items(GUILD).unwrap();
        assert!(admin.items(GUILD).unwrap().is_empty());
        let cleared: Collection = records.user(GUILD, RecordKind::Collectables, UserId(1)).unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn confirmed_delete_removes_the_item_named_at_request_time() {
        let admin = admin();
        admin.create_item(GUILD, "Coin", 5, Rarity::R).unwrap();
        admin.create_item(GUILD, "Gem", 5, Rarity::R).unwrap();

        assert_eq!(admin.request_delete_item(GUILD, UserId(9), "co").unwrap(), "Coin");
        assert_eq!(admin.items(GUILD).unwrap().len(), 2);

        let done = admin.confirm(GUILD, UserId(9)).unwrap();
        assert!(matches!(done, ConfirmedOperation::ItemDeleted(item) if item.name == "Coin"));
        assert_eq!(admin.items(GUILD).unwrap().len(), 1);
        assert!(matches!(
            admin.confirm(GUILD, UserId(9)),
            Err(RuntimeError::NothingToConfirm)
        ));
    }

    #[test]
    fn cancelled_reset_changes_nothing() {
        let admin = admin();
        admin.create_item(GUILD, "Coin", 5, Rarity::R).unwrap();
        admin.add_tokens(GUILD, UserId(1), Rarity::SR, 2).unwrap();
        admin.request_reset_items(GUILD, UserId(9)).unwrap();
        admin.request_reset_tokens(GUILD, UserId(9)).unwrap();

        assert!(matches!(
            admin.confirm(GUILD, UserId(10)),
            Err(RuntimeError::NothingToConfirm)
        ));
        assert_eq!(admin.cancel(GUILD, UserId(9)).unwrap(), PendingOperation::ResetItems);
        assert_eq!(admin.cancel(GUILD, UserId(9)).unwrap(), PendingOperation::ResetTokens);
        assert!(admin.cancel(GUILD, UserId(9)).is_err());

        assert_eq!(admin.items(GUILD).unwrap().len(), 1);
        assert_eq!(admin.add_tokens(GUILD, UserId(1), Rarity::SR, 0).unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_reset_expires() {
        let admin = admin().with_confirm_timeout(Duration::from_secs(30));
        admin.add_tokens(GUILD, UserId(1), Rarity::SR, 2).unwrap();
        admin.request_reset_tokens(GUILD, UserId(9)).unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(matches!(
            admin.confirm(GUILD, UserId(9)),
            Err(RuntimeError::NothingToConfirm)
        ));
        assert_eq!(admin.add_tokens(GUILD, UserId(1), Rarity::SR, 0).unwrap(), 2);

        admin.request_reset_tokens(GUILD, UserId(9)).unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(admin.confirm(GUILD, UserId(9)).unwrap(), ConfirmedOperation::TokensReset);
        assert_eq!(admin.add_tokens(GUILD, UserId(1), Rarity::SR, 0).unwrap(), 0);
    }

    #[test]
    fn pity_and_bias_are_range_checked() {
        let records = GuildRecords::in_memory();
        let admin = AdminService::new(records.clone());
        assert!(admin.set_pity_max(GUILD, 0).is_err());
        assert!(admin.set_pity_max(GUILD, 501).is_err());
        admin.set_pity_max(GUILD, 40).unwrap();
        assert_eq!(records.pity_max(GUILD).unwrap(), 40);
        assert!(admin.set_boss_skill_bias(GUILD, 101).is_err());
    }

    #[test]
    fn boss_skills_are_capped() {
        let admin = admin();
        admin.create_boss(GUILD, "Golem").unwrap();
        for name in ["Slam", "Roar", "Crush"] {
            admin
                .add_boss_skill(GUILD, "golem", BossSkill::new(name, ElementalType::Earth, 40))
                .unwrap();
        }
        assert!(admin
            .add_boss_skill(GUILD, "golem", BossSkill::new("Stomp", ElementalType::Earth, 40))
            .is_err());
        let boss = admin.remove_boss_skill(GUILD, "golem", "roar").unwrap();
        assert_eq!(boss.skills.len(), 2);
        assert!(admin.remove_boss_skill(GUILD, "golem", "roar").is_err());

        let boss = admin.edit_boss(GUILD, "golem", BossField::Reward, "500").unwrap();
        assert_eq!(boss.reward, 500);
    }

    #[test]
    fn exchanges_get_sequential_ids() {
        let admin = admin();
        let first = admin.create_exchange(GUILD, "Crown").unwrap();
        let second = admin.create_exchange(GUILD, "Cape").unwrap();
        assert_eq!((first.id.as_str(), second.id.as_str()), ("1", "2"));

        let priced = admin.set_exchange_price(GUILD, "2", Rarity::SSR, 3).unwrap();
        assert_eq!(priced.prices.get(&Rarity::SSR), Some(&3));
        assert!(admin.set_exchange_price(GUILD, "9", Rarity::SSR, 3).is_err());
    }

    #[test]
    fn token_grants() {
        let admin = admin();
        assert_eq!(admin.add_tokens(GUILD, UserId(1), Rarity::SR, 2).unwrap(), 2);
        assert!(admin.remove_tokens(GUILD, UserId(1), Rarity::SR, 3).is_err());
        assert_eq!(admin.remove_tokens(GUILD, UserId(1), Rarity::SR, 2).unwrap(), 0);
    }

    #[test]
    fn collectable_replies_need_a_collectable_item() {
        let admin = admin();
        admin.create_item(GUILD, "Coin", 5, Rarity::R).unwrap();
        let err = admin
            .edit_item(GUILD, "coin", ItemField::CollectableReply1, "clink")
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Validation(ValidationError::NotCollectable(_))
        ));

        admin.edit_item(GUILD, "coin", ItemField::Collectable, "3").unwrap();
        let item = admin
            .edit_item(GUILD, "coin", ItemField::CollectableReply2, "clink")
            .unwrap();
        assert_eq!(item.collectable_replies[1].as_deref(), Some("clink"));

        let item = admin.edit_item(GUILD, "coin", ItemField::Collectable, "0").unwrap();
        assert_eq!(item.collectable_replies, [None, None, None]);
    }

    #[test]
    fn field_names_parse_with_aliases() {
        assert_eq!("chance".parse::<ItemField>().ok(), Some(ItemField::Weight));
        assert_eq!("ROLE".parse::<ItemField>().ok(), Some(ItemField::Unlock));
        assert_eq!("give_tokens".parse::<ItemField>().ok(), Some(ItemField::GiveTokens));
        assert_eq!(
            "replyCollectable2".parse::<ItemField>().ok(),
            Some(ItemField::CollectableReply2)
        );
        assert_eq!("hp".parse::<BossField>().ok(), Some(BossField::Hp));
    }
}
