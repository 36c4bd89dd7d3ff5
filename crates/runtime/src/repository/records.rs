//! Typed access to guild documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use gacha_core::{GameConfig, GuildId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::repository::{GuildStore, InMemoryGuildStore, RecordKind, RepositoryError, Result};

/// Scalar settings stored in the guild's config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigKey {
    PityMax,
    BossSkillBiasPercent,
}

/// Serde layer over a [`GuildStore`].
///
/// Catalog lists round-trip as `{"<list_key>": [...]}`; per-user records as
/// an object keyed by the user's id. Every user shares the same document, so
/// writes to per-user records always go through [`GuildStore::update`] and
/// never through a load followed by a save.
#[derive(Clone)]
pub struct GuildRecords {
    store: Arc<dyn GuildStore>,
}

impl GuildRecords {
    pub fn new(store: Arc<dyn GuildStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryGuildStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn GuildStore> {
        &self.store
    }

    // ========================================================================
    // Lists
    // ========================================================================

    pub fn list<T: DeserializeOwned>(&self, guild: GuildId, kind: RecordKind) -> Result<Vec<T>> {
        let Some(mut document) = self.store.load(guild, kind)? else {
            return Ok(Vec::new());
        };
        match document.get_mut(kind.list_key()).map(Value::take) {
            Some(list) => serde_json::from_value(list).map_err(|e| corrupted(guild, kind, e)),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_list<T: Serialize>(
        &self,
        guild: GuildId,
        kind: RecordKind,
        records: &[T],
    ) -> Result<()> {
        let mut document = Map::new();
        document.insert(kind.list_key().to_string(), serde_json::to_value(records)?);
        self.store.save(guild, kind, &Value::Object(document))
    }

    // ========================================================================
    // Config
    // ========================================================================

    pub fn config<T: DeserializeOwned>(&self, guild: GuildId, key: ConfigKey) -> Result<Option<T>> {
        let Some(mut document) = self.store.load(guild, RecordKind::Config)? else {
            return Ok(None);
        };
        match document.get_mut(key.as_ref()).map(Value::take) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| corrupted(guild, RecordKind::Config, e)),
        }
    }

    pub fn set_config<T: Serialize>(&self, guild: GuildId, key: ConfigKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.transaction(guild, &[RecordKind::Config], |documents| {
            documents.set_key(RecordKind::Config, key.as_ref(), value)
        })
    }

    pub fn pity_max(&self, guild: GuildId) -> Result<u32> {
        Ok(self
            .config(guild, ConfigKey::PityMax)?
            .unwrap_or(GameConfig::DEFAULT_PITY_MAX))
    }

    /// The runtime's rules with this guild's overrides applied.
    pub fn game_config(&self, guild: GuildId, base: &GameConfig) -> Result<GameConfig> {
        let mut config = base.clone();
        if let Some(bias) = self.config::<u8>(guild, ConfigKey::BossSkillBiasPercent)? {
            config.boss_skill_bias_percent = bias.min(100);
        }
        Ok(config)
    }

    // ========================================================================
    // Per-user records
    // ========================================================================

    /// A user's record, or its default when absent.
    pub fn user<T>(&self, guild: GuildId, kind: RecordKind, user: UserId) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(mut document) = self.store.load(guild, kind)? else {
            return Ok(T::default());
        };
        match document.get_mut(user.to_string().as_str()).map(Value::take) {
            Some(Value::Null) | None => Ok(T::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| corrupted(guild, kind, e)),
        }
    }

    pub fn save_user<T: Serialize>(
        &self,
        guild: GuildId,
        kind: RecordKind,
        user: UserId,
        value: &T,
    ) -> Result<()> {
        self.transaction(guild, &[kind], |documents| {
            documents.set_user(kind, user, value)
        })
    }

    /// Read-modify-write of one user's record. Nothing is written when `f`
    /// fails.
    pub fn update_user<T, R, E>(
        &self,
        guild: GuildId,
        kind: RecordKind,
        user: UserId,
        f: impl FnOnce(&mut T) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        T: Serialize + DeserializeOwned + Default,
        E: From<RepositoryError>,
    {
        self.transaction(guild, &[kind], |documents| {
            let mut record: T = documents.user(kind, user)?;
            let value = f(&mut record)?;
            documents.set_user(kind, user, &record)?;
            Ok(value)
        })
    }

    /// Every user's record of one kind, keyed by user id.
    pub fn users<T: DeserializeOwned>(
        &self,
        guild: GuildId,
        kind: RecordKind,
    ) -> Result<BTreeMap<String, T>> {
        match self.store.load(guild, kind)? {
            Some(document) => {
                serde_json::from_value(document).map_err(|e| corrupted(guild, kind, e))
            }
            None => Ok(BTreeMap::new()),
        }
    }

    /// Read-modify-write of every user's record of one kind.
    pub fn update_users<T, R, E>(
        &self,
        guild: GuildId,
        kind: RecordKind,
        f: impl FnOnce(&mut BTreeMap<String, T>) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<RepositoryError>,
    {
        self.transaction(guild, &[kind], |documents| {
            let mut records: BTreeMap<String, T> = documents.users(kind)?;
            let value = f(&mut records)?;
            documents.set_users(kind, &records)?;
            Ok(value)
        })
    }

    /// Drop a whole document, e.g. every user's collectables.
    pub fn reset(&self, guild: GuildId, kind: RecordKind) -> Result<()> {
        self.store.delete(guild, kind)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run `f` over several documents of one guild as one store update.
    ///
    /// Either every change `f` made is written or, when it returns an error,
    /// none is.
    pub fn transaction<R, E>(
        &self,
        guild: GuildId,
        kinds: &[RecordKind],
        f: impl FnOnce(&mut Documents<'_>) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<RepositoryError>,
    {
        let mut f = Some(f);
        let mut outcome = None;
        self.store.update(guild, kinds, &mut |values| {
            let Some(f) = f.take() else {
                return Ok(false);
            };
            let mut documents = Documents {
                guild,
                kinds,
                values,
            };
            let result = f(&mut documents);
            let commit = result.is_ok();
            outcome = Some(result);
            Ok(commit)
        })?;

        match outcome {
            Some(result) => result,
            None => Err(RepositoryError::UpdateSkipped {
                guild: guild.to_string(),
            }
            .into()),
        }
    }
}

/// Documents loaded for one [`GuildRecords::transaction`].
pub struct Documents<'a> {
    guild: GuildId,
    kinds: &'a [RecordKind],
    values: &'a mut [Value],
}

impl Documents<'_> {
    fn slot(&self, kind: RecordKind) -> Result<usize> {
        self.kinds
            .iter()
            .position(|k| *k == kind)
            .ok_or(RepositoryError::NotInUpdate { kind: kind.name() })
    }

    pub fn user<T>(&self, kind: RecordKind, user: UserId) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let slot = self.slot(kind)?;
        match self.values[slot].get(user.to_string().as_str()) {
            Some(Value::Null) | None => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| corrupted(self.guild, kind, e)),
        }
    }

    pub fn set_user<T: Serialize>(&mut self, kind: RecordKind, user: UserId, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_key(kind, &user.to_string(), value)
    }

    pub fn users<T: DeserializeOwned>(&self, kind: RecordKind) -> Result<BTreeMap<String, T>> {
        let slot = self.slot(kind)?;
        match &self.values[slot] {
            Value::Null => Ok(BTreeMap::new()),
            value => {
                serde_json::from_value(value.clone()).map_err(|e| corrupted(self.guild, kind, e))
            }
        }
    }

    pub fn set_users<T: Serialize>(
        &mut self,
        kind: RecordKind,
        records: &BTreeMap<String, T>,
    ) -> Result<()> {
        let slot = self.slot(kind)?;
        self.values[slot] = serde_json::to_value(records)?;
        Ok(())
    }

    /// Delete the whole document on commit.
    pub fn clear(&mut self, kind: RecordKind) -> Result<()> {
        let slot = self.slot(kind)?;
        self.values[slot] = Value::Null;
        Ok(())
    }

    fn set_key(&mut self, kind: RecordKind, key: &str, value: Value) -> Result<()> {
        let slot = self.slot(kind)?;
        let mut map = match std::mem::take(&mut self.values[slot]) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert(key.to_string(), value);
        self.values[slot] = Value::Object(map);
        Ok(())
    }
}

fn corrupted(guild: GuildId, kind: RecordKind, err: serde_json::Error) -> RepositoryError {
    RepositoryError::CorruptedData {
        guild: guild.to_string(),
        kind: kind.name(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_core::{Collection, PityState, Rarity, RewardItem};

    const GUILD: GuildId = GuildId(1);

    #[test]
    fn lists_round_trip_under_their_key() {
        let records = GuildRecords::in_memory();
        let items = vec![RewardItem::new("Aria", 5, Rarity::SSR)];
        records.save_list(GUILD, RecordKind::Items, &items).unwrap();

        let raw = records.store().load(GUILD, RecordKind::Items).unwrap().unwrap();
        assert!(raw.get("items").is_some_and(Value::is_array));

        let loaded: Vec<RewardItem> = records.list(GUILD, RecordKind::Items).unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn missing_user_record_defaults() {
        let records = GuildRecords::in_memory();
        let pity: PityState = records.user(GUILD, RecordKind::Pity, UserId(9)).unwrap();
        assert_eq!(pity, PityState::default());
    }

    #[test]
    fn user_records_are_isolated() {
        let records = GuildRecords::in_memory();
        let mut collection = Collection::default();
        collection.increment("Coin");
        records
            .save_user(GUILD, RecordKind::Collectables, UserId(1), &collection)
            .unwrap();

        let other: Collection = records.user(GUILD, RecordKind::Collectables, UserId(2)).unwrap();
        assert!(other.is_empty());
        let all: BTreeMap<String, Collection> =
            records.users(GUILD, RecordKind::Collectables).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["1"].count("Coin"), 1);
    }

    #[test]
    fn config_defaults_and_overrides() {
        let records = GuildRecords::in_memory();
        assert_eq!(records.pity_max(GUILD).unwrap(), GameConfig::DEFAULT_PITY_MAX);
        records.set_config(GUILD, ConfigKey::PityMax, &50u32).unwrap();
        records
            .set_config(GUILD, ConfigKey::BossSkillBiasPercent, &10u8)
            .unwrap();
        assert_eq!(records.pity_max(GUILD).unwrap(), 50);
        let config = records.game_config(GUILD, &GameConfig::default()).unwrap();
        assert_eq!(config.boss_skill_bias_percent, 10);
    }

    #[test]
    fn failed_update_keeps_the_record() {
        let records = GuildRecords::in_memory();
        records.save_user(GUILD, RecordKind::TotalSpins, UserId(1), &3u64).unwrap();

        let result: Result<()> =
            records.update_user(GUILD, RecordKind::TotalSpins, UserId(1), |spins: &mut u64| {
                *spins += 1;
                Err(RepositoryError::LockPoisoned)
            });
        assert!(result.is_err());
        let spins: u64 = records.user(GUILD, RecordKind::TotalSpins, UserId(1)).unwrap();
        assert_eq!(spins, 3);
    }

    #[test]
    fn transaction_rejects_undeclared_documents() {
        let records = GuildRecords::in_memory();
        let result: Result<()> = records.transaction(GUILD, &[RecordKind::Pity], |documents| {
            documents.set_user(RecordKind::Pity, UserId(1), &PityState::default())?;
            documents.set_user(RecordKind::Tokens, UserId(1), &1u32)
        });
        assert!(matches!(result, Err(RepositoryError::NotInUpdate { kind: "tokens" })));
        assert!(!records.store().exists(GUILD, RecordKind::Pity));
    }

    #[test]
    fn concurrent_writers_of_different_users_keep_every_update() {
        let records = GuildRecords::in_memory();
        let writers: Vec<_> = (0..16u64)
            .map(|n| {
                let records = records.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        records
                            .update_user(GUILD, RecordKind::TotalSpins, UserId(n), |spins: &mut u64| {
                                *spins += 1;
                                Ok::<_, RepositoryError>(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let all: BTreeMap<String, u64> = records.users(GUILD, RecordKind::TotalSpins).unwrap();
        assert_eq!(all.len(), 16);
        assert!(all.values().all(|spins| *spins == 50));
    }
}
