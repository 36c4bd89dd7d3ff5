//! Content factory resolving guild files from a data directory.

use std::path::{Path, PathBuf};

use crate::loaders::{Catalog, CatalogLoader, GuildSettings, LoadResult, SettingsLoader};

/// Loads guild content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── catalog.ron
/// ├── settings.toml
/// └── guilds/
///     ├── 1234.ron
///     └── 1234.toml
/// ```
///
/// Guild-specific files override the shared ones; missing settings fall back
/// to defaults, a missing catalog yields an empty one.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn load_catalog(&self, guild: &str) -> LoadResult<Catalog> {
        match self.resolve(guild, "ron", "catalog.ron") {
            Some(path) => CatalogLoader::load(&path),
            None => Ok(Catalog::default()),
        }
    }

    pub fn load_settings(&self, guild: &str) -> LoadResult<GuildSettings> {
        match self.resolve(guild, "toml", "settings.toml") {
            Some(path) => SettingsLoader::load(&path),
            None => Ok(GuildSettings::default()),
        }
    }

    fn resolve(&self, guild: &str, extension: &str, shared: &str) -> Option<PathBuf> {
        let specific = self
            .data_dir
            .join("guilds")
            .join(format!("{guild}.{extension}"));
        if specific.is_file() {
            return Some(specific);
        }
        let shared = self.data_dir.join(shared);
        shared.is_file().then_some(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_file_overrides_shared() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("guilds")).unwrap();
        std::fs::write(dir.path().join("settings.toml"), "pity_max = 80").unwrap();
        std::fs::write(dir.path().join("guilds/7.toml"), "pity_max = 10").unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_settings("7").unwrap().pity_max, 10);
        assert_eq!(factory.load_settings("8").unwrap().pity_max, 80);
    }

    #[test]
    fn missing_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.data_dir(), dir.path());
        assert!(factory.load_catalog("1").unwrap().items.is_empty());
        assert_eq!(factory.load_settings("1").unwrap(), GuildSettings::default());
    }

    #[test]
    fn bundled_demo_data_is_valid() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../data"));
        let catalog = factory.load_catalog("1").unwrap();
        assert_eq!(catalog.items.len(), 8);
        assert_eq!(catalog.bosses.len(), 2);
        assert_eq!(catalog.exchanges.len(), 2);
        assert!(catalog.items.iter().any(|item| item.secret));
        assert_eq!(factory.load_settings("1").unwrap().pity_max, 90);
    }
}
