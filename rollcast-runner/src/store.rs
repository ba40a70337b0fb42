//! Persistent artifact store backed by one JSON file per signature.

use std::path::{Path, PathBuf};

use rollcast_core::{ArtifactStore, ModelArtifact, ModelKey, StoreError};

/// On-disk artifact store.
///
/// Artifacts are content-addressed by `ModelKey::storage_key()`, so repeated
/// evaluations — including optimization trials in other processes sharing the
/// directory — reuse each other's models. Writers racing on the same key
/// write equivalent bytes; last writer wins.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Creates the store, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Write {
            key: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    /// Number of artifacts currently on disk.
    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StoreError::Read {
            key: self.dir.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("json")
            })
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Removes all stored artifacts.
    pub fn clear(&self) -> Result<(), StoreError> {
        for entry in std::fs::read_dir(&self.dir).map_err(|e| StoreError::Read {
            key: self.dir.display().to_string(),
            reason: e.to_string(),
        })? {
            let entry = entry.map_err(|e| StoreError::Read {
                key: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                std::fs::remove_file(&path).map_err(|e| StoreError::Write {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn artifact_path(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_key()))
    }
}

impl ArtifactStore for DiskStore {
    fn load(&self, key: &ModelKey) -> Result<Option<ModelArtifact>, StoreError> {
        let path = self.artifact_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&json).map_err(|e| StoreError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(artifact))
    }

    fn store(&self, key: &ModelKey, artifact: &ModelArtifact) -> Result<(), StoreError> {
        let path = self.artifact_path(key);
        let json = serde_json::to_string(artifact).map_err(|e| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
