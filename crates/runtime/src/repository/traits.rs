//! Storage contract for per-guild documents.

use gacha_core::GuildId;
use serde_json::Value;

use crate::repository::Result;

/// One JSON document per guild.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    Config,
    Items,
    Bosses,
    CommonSkills,
    Exchanges,
    Pity,
    Collectables,
    Tokens,
    Unlocks,
    Favorites,
    TotalSpins,
}

impl RecordKind {
    /// Snake-case name, as used in file names.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Lists are stored wrapped in an object under this key, e.g.
    /// `{"items": [...]}`.
    pub fn list_key(self) -> &'static str {
        match self {
            RecordKind::Items => "items",
            RecordKind::Bosses => "bosses",
            RecordKind::CommonSkills => "skills",
            RecordKind::Exchanges => "exchanges",
            _ => "records",
        }
    }
}

/// Keyed document store addressed by guild and record kind.
///
/// `save` replaces a document outright. Anything that reads a document and
/// writes it back goes through [`GuildStore::update`], which holds the store's
/// write lock for the whole cycle.
pub trait GuildStore: Send + Sync {
    /// Load a document; `None` when it was never written.
    fn load(&self, guild: GuildId, kind: RecordKind) -> Result<Option<Value>>;

    /// Replace a document.
    fn save(&self, guild: GuildId, kind: RecordKind, value: &Value) -> Result<()>;

    /// Remove a document. Missing documents are not an error.
    fn delete(&self, guild: GuildId, kind: RecordKind) -> Result<()>;

    /// Read-modify-write of several documents of one guild in one step.
    ///
    /// `apply` is called exactly once with the current documents in `kinds`
    /// order, `Value::Null` for missing ones. `Ok(true)` writes every document
    /// back; `Ok(false)` or an error writes nothing. A document left as
    /// `Value::Null` is deleted.
    fn update(
        &self,
        guild: GuildId,
        kinds: &[RecordKind],
        apply: &mut dyn FnMut(&mut [Value]) -> Result<bool>,
    ) -> Result<()>;

    fn exists(&self, guild: GuildId, kind: RecordKind) -> bool {
        matches!(self.load(guild, kind), Ok(Some(_)))
    }
}
