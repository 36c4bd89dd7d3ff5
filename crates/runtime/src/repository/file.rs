//! File-based GuildStore implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use gacha_core::GuildId;
use serde_json::Value;

use crate::repository::{GuildStore, RecordKind, RepositoryError, Result};

/// File-based implementation of GuildStore.
///
/// # File Format
///
/// Each document is stored as pretty-printed JSON in
/// `{guild}_{kind}.json`, e.g. `1234_items.json`. Writes go to a uniquely
/// named temporary file first and are renamed into place. All writes of one
/// store are serialized; reads never block.
pub struct FileGuildStore {
    base_dir: PathBuf,
    writes: Mutex<()>,
    temp_seq: AtomicU64,
}

impl FileGuildStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self {
            base_dir,
            writes: Mutex::new(()),
            temp_seq: AtomicU64::new(0),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn document_path(&self, guild: GuildId, kind: RecordKind) -> PathBuf {
        self.base_dir.join(format!("{}_{}.json", guild, kind))
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq))
    }

    fn write_lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.writes.lock().map_err(|_| RepositoryError::LockPoisoned)
    }

    /// Serialize `value` next to `path` without touching `path` itself.
    fn stage(&self, path: &Path, value: &Value) -> Result<PathBuf> {
        let temp_path = self.temp_path(path);
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        if let Err(err) = fs::write(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(RepositoryError::Io(err));
        }
        Ok(temp_path)
    }
}

impl GuildStore for FileGuildStore {
    fn load(&self, guild: GuildId, kind: RecordKind) -> Result<Option<Value>> {
        let path = self.document_path(guild, kind);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::CorruptedData {
                guild: guild.to_string(),
                kind: kind.name(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Loaded {}[{}] from {}", kind, guild, path.display());

        Ok(Some(value))
    }

    fn save(&self, guild: GuildId, kind: RecordKind, value: &Value) -> Result<()> {
        let path = self.document_path(guild, kind);
        let _lock = self.write_lock()?;

        let temp_path = self.stage(&path, value)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved {}[{}] to {}", kind, guild, path.display());

        Ok(())
    }

    fn delete(&self, guild: GuildId, kind: RecordKind) -> Result<()> {
        let path = self.document_path(guild, kind);
        let _lock = self.write_lock()?;

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted {}[{}]", kind, guild);
        }

        Ok(())
    }

    /// Every document is staged before the first rename, so a failed write
    /// leaves all of them as they were.
    fn update(
        &self,
        guild: GuildId,
        kinds: &[RecordKind],
        apply: &mut dyn FnMut(&mut [Value]) -> Result<bool>,
    ) -> Result<()> {
        let _lock = self.write_lock()?;

        let mut documents = Vec::with_capacity(kinds.len());
        for kind in kinds {
            documents.push(self.load(guild, *kind)?.unwrap_or(Value::Null));
        }
        if !apply(&mut documents)? {
            return Ok(());
        }

        let mut staged: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(kinds.len());
        for (kind, value) in kinds.iter().zip(&documents) {
            let path = self.document_path(guild, *kind);
            if value.is_null() {
                staged.push((path, None));
                continue;
            }
            match self.stage(&path, value) {
                Ok(temp_path) => staged.push((path, Some(temp_path))),
                Err(err) => {
                    for temp_path in staged.iter().filter_map(|(_, temp)| temp.as_ref()) {
                        let _ = fs::remove_file(temp_path);
                    }
                    return Err(err);
                }
            }
        }

        for (path, temp_path) in staged {
            match temp_path {
                Some(temp_path) => fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?,
                None if path.exists() => fs::remove_file(&path).map_err(RepositoryError::Io)?,
                None => {}
            }
        }
        tracing::debug!("Updated {} document(s) of guild {}", kinds.len(), guild);

        Ok(())
    }

    fn exists(&self, guild: GuildId, kind: RecordKind) -> bool {
        self.document_path(guild, kind).exists()
    }
}
