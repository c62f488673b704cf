//! File-based persistence backend.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use game_core::{EntityId, InventorySaveData, LedgerSaveData, PersistenceHooks};

use super::{RepositoryError, Result};

/// Stores one JSON document per entity and component under `base_dir`.
///
/// Writes go to a temp file first and are renamed into place, so a reader
/// never observes a half-written save.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    base_dir: PathBuf,
}

impl FilePersistence {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn inventory_path(&self, owner: EntityId) -> PathBuf {
        self.base_dir.join(format!("inventory_{}.json", owner.0))
    }

    fn ledger_path(&self, owner: EntityId) -> PathBuf {
        self.base_dir.join(format!("ledger_{}.json", owner.0))
    }

    pub fn read_inventory(&self, owner: EntityId) -> Result<Option<InventorySaveData>> {
        let path = self.inventory_path(owner);
        let Some(data) = read_json::<InventorySaveData>(&path)? else {
            return Ok(None);
        };
        if data.owner != owner {
            return Err(RepositoryError::OwnerMismatch {
                path: path.display().to_string(),
                expected: owner,
                found: data.owner,
            });
        }
        Ok(Some(data))
    }

    pub fn read_ledger(&self, owner: EntityId) -> Result<Option<LedgerSaveData>> {
        read_json(&self.ledger_path(owner))
    }

    pub fn write_inventory(&self, owner: EntityId, data: &InventorySaveData) -> Result<()> {
        write_json(&self.inventory_path(owner), data)
    }

    pub fn write_ledger(&self, owner: EntityId, data: &LedgerSaveData) -> Result<()> {
        write_json(&self.ledger_path(owner), data)
    }
}

impl PersistenceHooks for FilePersistence {
    fn load_inventory(&self, owner: EntityId) -> Option<InventorySaveData> {
        self.read_inventory(owner).unwrap_or_else(|err| {
            tracing::warn!(%owner, %err, "ignoring unreadable inventory save");
            None
        })
    }

    fn save_inventory(&self, owner: EntityId, data: &InventorySaveData) {
        if let Err(err) = self.write_inventory(owner, data) {
            tracing::error!(%owner, %err, "failed to save inventory");
        }
    }

    fn load_ledger(&self, owner: EntityId) -> Option<LedgerSaveData> {
        self.read_ledger(owner).unwrap_or_else(|err| {
            tracing::warn!(%owner, %err, "ignoring unreadable ledger save");
            None
        })
    }

    fn save_ledger(&self, owner: EntityId, data: &LedgerSaveData) {
        if let Err(err) = self.write_ledger(owner, data) {
            tracing::error!(%owner, %err, "failed to save ledger");
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let value = serde_json::from_str(&json).map_err(|e| RepositoryError::Json(e.to_string()))?;
    tracing::debug!("Loaded save: {}", path.display());
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    let json =
        serde_json::to_string_pretty(value).map_err(|e| RepositoryError::Json(e.to_string()))?;
    fs::write(&temp_path, json)?;

    // Atomic rename
    fs::rename(&temp_path, path)?;

    tracing::trace!("Saved: {}", path.display());
    Ok(())
}
