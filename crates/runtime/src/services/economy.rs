//! Inventory, tokens, selling, exchanges and favorites.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use gacha_core::{
    Collection, Exchange, GuildId, ObjectKind, Rarity, RewardItem, TokenWallet, UserId,
    ValidationError, find_by_name,
};

use crate::api::{Result, RuntimeError};
use crate::providers::{EconomyGateway, GatewayError};
use crate::repository::{GuildRecords, RecordKind};
use crate::services::UserLocks;

/// One inventory line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub name: String,
    pub rarity: Rarity,
    pub kind: ObjectKind,
    pub count: u32,
    /// Payout per copy, 0 when not sellable.
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReceipt {
    pub item: String,
    pub quantity: u32,
    pub total: u64,
    /// Copies left after the sale.
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemReceipt {
    pub exchange: Exchange,
    /// Marker granted by the exchange, if it carries one.
    pub unlock: Option<String>,
}

/// User-facing economy operations for one guild.
#[derive(Clone)]
pub struct EconomyService {
    records: GuildRecords,
    economy: Arc<dyn EconomyGateway>,
    locks: UserLocks,
    payout_timeout: Duration,
}

impl EconomyService {
    pub fn new(
        records: GuildRecords,
        economy: Arc<dyn EconomyGateway>,
        locks: UserLocks,
        payout_timeout: Duration,
    ) -> Self {
        Self {
            records,
            economy,
            locks,
            payout_timeout,
        }
    }

    /// Person and object copies the user holds, in catalog order.
    pub fn inventory(&self, guild: GuildId, user: UserId) -> Result<Vec<InventoryEntry>> {
        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        let collection: Collection = self.records.user(guild, RecordKind::Collectables, user)?;

        Ok(items
            .iter()
            .filter(|item| item.kind.is_inventory())
            .filter_map(|item| {
                let count = collection.count(&item.name);
                (count > 0).then(|| InventoryEntry {
                    name: item.name.clone(),
                    rarity: item.rarity,
                    kind: item.kind,
                    count,
                    price: item.price,
                })
            })
            .collect())
    }

    pub fn tokens(&self, guild: GuildId, user: UserId) -> Result<TokenWallet> {
        Ok(self.records.user(guild, RecordKind::Tokens, user)?)
    }

    /// Sell copies for `price × quantity`.
    ///
    /// The credit goes through the economy gateway first; the collection is
    /// only decremented once the gateway confirms it.
    pub async fn sell(
        &self,
        guild: GuildId,
        user: UserId,
        query: &str,
        quantity: u32,
    ) -> Result<SaleReceipt> {
        if quantity == 0 {
            return Err(ValidationError::InvalidValue {
                field: "quantity",
                value: quantity.to_string(),
            }
            .into());
        }
        let _guard = self.locks.lock(guild, user).await;

        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        let item = find_by_name(&items, query).ok_or_else(|| ValidationError::NotFound {
            kind: "item",
            name: query.to_string(),
        })?;
        if !item.is_sellable() {
            return Err(RuntimeError::NotSellable(item.name.clone()));
        }

        let collection: Collection = self.records.user(guild, RecordKind::Collectables, user)?;
        // Dry run: ownership is checked before anything is credited.
        collection.clone().remove(&item.name, quantity)?;
        let total = item.price.saturating_mul(u64::from(quantity));

        let credited = tokio::time::timeout(self.payout_timeout, self.economy.credit(guild, user, total))
            .await
            .unwrap_or(Err(GatewayError::TimedOut));
        if let Err(err) = credited {
            tracing::warn!(%guild, %user, item = %item.name, total, error = %err, "sale payout failed");
            return Err(RuntimeError::Gateway(err));
        }

        let remaining = self.records.update_user(
            guild,
            RecordKind::Collectables,
            user,
            |collection: &mut Collection| -> Result<u32> {
                Ok(collection.remove(&item.name, quantity)?)
            },
        )?;
        tracing::info!(%guild, %user, item = %item.name, quantity, total, "sold");

        Ok(SaleReceipt {
            item: item.name.clone(),
            quantity,
            total,
            remaining,
        })
    }

    pub fn exchanges(&self, guild: GuildId) -> Result<Vec<Exchange>> {
        Ok(self.records.list(guild, RecordKind::Exchanges)?)
    }

    /// Redeem an exchange by id or reward name. Token prices are debited all
    /// at once or not at all.
    pub async fn redeem(&self, guild: GuildId, user: UserId, query: &str) -> Result<RedeemReceipt> {
        let _guard = self.locks.lock(guild, user).await;

        let exchanges = self.exchanges(guild)?;
        let exchange = exchanges
            .iter()
            .find(|e| e.id == query.trim())
            .or_else(|| find_by_name(&exchanges, query))
            .ok_or_else(|| ValidationError::NotFound {
                kind: "exchange",
                name: query.to_string(),
            })?
            .clone();

        let unlock = self.records.transaction(
            guild,
            &[RecordKind::Tokens, RecordKind::Unlocks],
            |documents| -> Result<Option<String>> {
                let mut wallet: TokenWallet = documents.user(RecordKind::Tokens, user)?;
                exchange.redeem(&mut wallet)?;
                documents.set_user(RecordKind::Tokens, user, &wallet)?;

                let Some(marker) = &exchange.unlock_marker else {
                    return Ok(None);
                };
                let mut unlocks: BTreeSet<String> = documents.user(RecordKind::Unlocks, user)?;
                if unlocks.insert(marker.clone()) {
                    documents.set_user(RecordKind::Unlocks, user, &unlocks)?;
                }
                Ok(Some(marker.clone()))
            },
        )?;
        tracing::info!(%guild, %user, exchange = %exchange.id, reward = %exchange.reward_name, "exchange redeemed");

        Ok(RedeemReceipt { exchange, unlock })
    }

    /// Pin a character as the user's favorite. Returns its canonical name.
    pub fn set_favorite(&self, guild: GuildId, user: UserId, query: &str) -> Result<String> {
        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        let item = find_by_name(&items, query).ok_or_else(|| ValidationError::NotFound {
            kind: "item",
            name: query.to_string(),
        })?;
        if item.kind != ObjectKind::Character {
            return Err(ValidationError::NotACharacter(item.name.clone()).into());
        }
        self.records
            .save_user(guild, RecordKind::Favorites, user, &Some(item.name.clone()))?;
        Ok(item.name.clone())
    }

    /// The favorite character, if set and still in the catalog.
    pub fn favorite(&self, guild: GuildId, user: UserId) -> Result<Option<RewardItem>> {
        let name: Option<String> = self.records.user(guild, RecordKind::Favorites, user)?;
        let Some(name) = name else {
            return Ok(None);
        };
        let items: Vec<RewardItem> = self.records.list(guild, RecordKind::Items)?;
        Ok(items.into_iter().find(|item| item.name == name))
    }
}
