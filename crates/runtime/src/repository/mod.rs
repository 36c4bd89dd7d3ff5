//! Repository layer for per-guild records.
//!
//! Every guild owns a handful of JSON documents, one per [`RecordKind`]:
//! catalog lists (items, bosses, skills, exchanges), scalar config and
//! per-user maps (pity, collectables, tokens, unlocks, favorites, spins).
//! Combat sessions never touch this layer; they live in memory only.

mod error;
mod file;
mod memory;
mod records;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileGuildStore;
pub use memory::InMemoryGuildStore;
pub use records::{ConfigKey, Documents, GuildRecords};
pub use traits::{GuildStore, RecordKind};
