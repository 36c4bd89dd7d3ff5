//! Data-driven guild content and its loaders.
//!
//! - Guild catalogs: reward items, bosses, common skills and exchanges (RON)
//! - Guild settings: pity and boss tuning (TOML)
//!
//! Loaded content is validated with the same rules the admin commands use,
//! then handed to the runtime to seed a guild's records.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{Catalog, CatalogLoader, ContentFactory, GuildSettings, SettingsLoader};
