//! File-backed log store: one pretty-printed JSON file per record.
//!
//! Storage location: `<log_dir>/<id>.json`, e.g.
//! `~/.socio/logs/processing_log_20250102_030405.json`.
//!
//! Files are created with exclusive-create semantics. Two writers racing for
//! the same second both probe upward through `_1`, `_2`, ... and each ends up
//! owning a distinct file; nothing is ever overwritten.

use async_trait::async_trait;
use socio_core::{LogId, LogKind, LogRecord, LogStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::resolve_reference;

/// A directory of JSON log records.
pub struct FileLogStore {
    dir: PathBuf,
}

impl FileLogStore {
    /// Open (creating if needed) the log directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create log directory {}: {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "File log store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &LogId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Ids of every well-formed record file of `kind` (all kinds when `None`).
    async fn scan(&self, kind: Option<LogKind>) -> Result<Vec<LogId>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(format!("Failed to read log directory: {e}"))),
        };

        let mut ids = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(format!("Failed to read log directory: {e}")))?
        {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            match LogId::parse(stem) {
                Some(id) if kind.is_none_or(|k| id.kind() == k) => ids.push(id),
                Some(_) => {}
                None => debug!(file = %stem, "Ignoring unrecognized file in log directory"),
            }
        }
        Ok(ids)
    }

    async fn read(&self, id: &LogId) -> Result<LogRecord, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(StoreError::Io(format!("Failed to read {id}: {e}"))),
        };

        let mut record: LogRecord =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if record.kind() != id.kind() {
            return Err(StoreError::Corrupt {
                id: id.to_string(),
                reason: format!("file holds a {:?} record", record.kind()),
            });
        }

        // The file name is authoritative.
        if record.id() != id.to_string() {
            record.set_id(id);
        }
        Ok(record)
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, mut record: LogRecord) -> Result<LogId, StoreError> {
        let mut id = record.base_id();
        loop {
            let path = self.path_for(&id);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    id = id.next();
                    continue;
                }
                Err(e) => {
                    return Err(StoreError::Io(format!(
                        "Failed to create {}: {e}",
                        path.display()
                    )));
                }
            };

            record.set_id(&id);
            let written = match serde_json::to_vec_pretty(&record) {
                Ok(json) => write_synced(&mut file, &json)
                    .await
                    .map_err(|e| StoreError::Io(format!("Failed to write {id}: {e}"))),
                Err(e) => Err(StoreError::Serialization(e.to_string())),
            };

            if let Err(e) = written {
                // Don't leave an empty file behind to shadow the id.
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }

            debug!(id = %id, kind = ?id.kind(), "Log record written");
            return Ok(id);
        }
    }

    async fn get(&self, reference: &str) -> Result<LogRecord, StoreError> {
        let id = resolve_reference(reference)?;
        self.read(&id).await
    }

    async fn list(&self, kind: LogKind) -> Result<Vec<LogRecord>, StoreError> {
        let mut ids = self.scan(Some(kind)).await?;
        ids.sort_by(|a, b| b.cmp(a));

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read(&id).await {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable log record"),
            }
        }
        Ok(records)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.scan(None).await?.len())
    }

    async fn discard(&self, reference: &str) -> Result<(), StoreError> {
        let id = resolve_reference(reference)?;
        match tokio::fs::remove_file(self.path_for(&id)).await {
            Ok(()) => {
                debug!(id = %id, "Log record discarded");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(StoreError::Io(format!("Failed to remove {id}: {e}"))),
        }
    }
}

async fn write_synced(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.sync_all().await
}
