//! Generic create/read/update/delete/list over named collections.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use uptime_core::key::is_valid_key;

const RECORD_SUFFIX: &str = ".json";

/// Errors from entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot open store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key: {collection}/{id}")]
    InvalidKey { collection: String, id: String },

    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Serialization error for {collection}/{id}: {reason}")]
    Serialization {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("I/O error on {collection}/{id}: {source}")]
    Io {
        collection: String,
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn io(collection: &str, id: &str, source: std::io::Error) -> Self {
        Self::Io {
            collection: collection.to_string(),
            id: id.to_string(),
            source,
        }
    }

    fn missing_or_io(collection: &str, id: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        } else {
            Self::io(collection, id, source)
        }
    }

    fn serialization(collection: &str, id: &str, err: &serde_json::Error) -> Self {
        Self::Serialization {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Key/value store with one file per record.
///
/// Holds no in-memory state besides the root path; workers sharing a root
/// synchronise only through the filesystem (exclusive create, advisory
/// locks on the record file).
#[derive(Debug, Clone)]
pub struct EntityStore {
    root: PathBuf,
}

impl EntityStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::Open {
                path: root.display().to_string(),
                source,
            })?;
        info!(root = %root.display(), "Entity store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_key(collection) || !is_valid_key(id) {
            return Err(StoreError::InvalidKey {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(self
            .root
            .join(collection)
            .join(format!("{id}{RECORD_SUFFIX}")))
    }

    /// Persist a new record. Fails with `AlreadyExists` rather than
    /// overwriting; concurrent creators of one id race on exclusive create.
    pub async fn create<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::serialization(collection, id, &e))?;

        fs::create_dir_all(self.root.join(collection))
            .await
            .map_err(|e| StoreError::io(collection, id, e))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    }
                } else {
                    StoreError::io(collection, id, e)
                }
            })?;

        let written = async {
            file.write_all(&body).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // Do not leave a half-written record behind.
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(collection, id, error = %cleanup, "Failed to remove partial record");
            }
            return Err(StoreError::io(collection, id, e));
        }

        debug!(collection, id, "Record created");
        Ok(())
    }

    /// Load a record, under a shared lock so a concurrent update is never
    /// observed half-written.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = blocking(move || {
            let mut file = std::fs::File::open(&path)?;
            FileExt::lock_shared(&file)?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
        .await
        .map_err(|e| StoreError::missing_or_io(collection, id, e))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::serialization(collection, id, &e))
    }

    /// Replace an existing record.
    ///
    /// The record file is opened without `create` and rewritten in place
    /// under an exclusive lock. A delete that lands first makes the open
    /// fail with `NotFound`; a delete that lands during the write unlinks
    /// the inode being written, so a deleted record never comes back.
    /// Concurrent updates of one id are last-write-wins.
    pub async fn update<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::serialization(collection, id, &e))?;

        blocking(move || {
            let mut file = std::fs::OpenOptions::new().write(true).open(&path)?;
            FileExt::lock_exclusive(&file)?;
            file.set_len(0)?;
            file.write_all(&body)?;
            file.sync_all()
        })
        .await
        .map_err(|e| StoreError::missing_or_io(collection, id, e))?;

        debug!(collection, id, "Record updated");
        Ok(())
    }

    /// Remove a record.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::missing_or_io(collection, id, e))?;
        debug!(collection, id, "Record deleted");
        Ok(())
    }

    /// Ids currently persisted in `collection`, sorted.
    ///
    /// A collection that has never been written is empty, not an error.
    pub async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        if !is_valid_key(collection) {
            return Err(StoreError::InvalidKey {
                collection: collection.to_string(),
                id: String::new(),
            });
        }

        let dir = self.root.join(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(collection, "*", e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(collection, "*", e))?
        {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(RECORD_SUFFIX)) else {
                continue;
            };
            if is_valid_key(id) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Run blocking file work off the async worker threads.
async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> std::io::Result<T> + Send + 'static,
) -> std::io::Result<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(std::io::Error::other)?
}
