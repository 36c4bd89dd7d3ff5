//! In-memory GuildStore implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use gacha_core::GuildId;
use serde_json::Value;

use crate::repository::{GuildStore, RecordKind, RepositoryError, Result};

type Documents = HashMap<(GuildId, RecordKind), Value>;

/// In-memory implementation of GuildStore.
#[derive(Default)]
pub struct InMemoryGuildStore {
    documents: RwLock<Documents>,
}

impl InMemoryGuildStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Documents>> {
        self.documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)
    }
}

impl GuildStore for InMemoryGuildStore {
    fn load(&self, guild: GuildId, kind: RecordKind) -> Result<Option<Value>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(documents.get(&(guild, kind)).cloned())
    }

    fn save(&self, guild: GuildId, kind: RecordKind, value: &Value) -> Result<()> {
        self.write()?.insert((guild, kind), value.clone());
        Ok(())
    }

    fn delete(&self, guild: GuildId, kind: RecordKind) -> Result<()> {
        self.write()?.remove(&(guild, kind));
        Ok(())
    }

    fn update(
        &self,
        guild: GuildId,
        kinds: &[RecordKind],
        apply: &mut dyn FnMut(&mut [Value]) -> Result<bool>,
    ) -> Result<()> {
        let mut documents = self.write()?;
        let mut working: Vec<Value> = kinds
            .iter()
            .map(|kind| documents.get(&(guild, *kind)).cloned().unwrap_or(Value::Null))
            .collect();

        if !apply(&mut working)? {
            return Ok(());
        }
        for (kind, value) in kinds.iter().zip(working) {
            if value.is_null() {
                documents.remove(&(guild, *kind));
            } else {
                documents.insert((guild, *kind), value);
            }
        }
        Ok(())
    }

    fn exists(&self, guild: GuildId, kind: RecordKind) -> bool {
        self.documents
            .read()
            .map(|documents| documents.contains_key(&(guild, kind)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GUILD: GuildId = GuildId(1);

    #[test]
    fn rejected_update_writes_nothing() {
        let store = InMemoryGuildStore::new();
        store.save(GUILD, RecordKind::Pity, &json!({"1": 4})).unwrap();

        store
            .update(GUILD, &[RecordKind::Pity, RecordKind::TotalSpins], &mut |docs| {
                docs[0] = json!({"1": 5});
                docs[1] = json!({"1": 1});
                Ok(false)
            })
            .unwrap();
        assert_eq!(store.load(GUILD, RecordKind::Pity).unwrap(), Some(json!({"1": 4})));
        assert!(!store.exists(GUILD, RecordKind::TotalSpins));

        let failed = store.update(GUILD, &[RecordKind::Pity], &mut |docs| {
            docs[0] = json!({"1": 6});
            Err(RepositoryError::LockPoisoned)
        });
        assert!(failed.is_err());
        assert_eq!(store.load(GUILD, RecordKind::Pity).unwrap(), Some(json!({"1": 4})));
    }

    #[test]
    fn committed_update_writes_every_document() {
        let store = InMemoryGuildStore::new();
        store.save(GUILD, RecordKind::Tokens, &json!({"1": {}})).unwrap();

        store
            .update(GUILD, &[RecordKind::Pity, RecordKind::Tokens], &mut |docs| {
                assert!(docs[0].is_null());
                docs[0] = json!({"1": 1});
                docs[1] = Value::Null;
                Ok(true)
            })
            .unwrap();
        assert_eq!(store.load(GUILD, RecordKind::Pity).unwrap(), Some(json!({"1": 1})));
        assert!(!store.exists(GUILD, RecordKind::Tokens));
    }
}
