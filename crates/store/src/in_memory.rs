//! In-memory log store, useful for testing and ephemeral engines.

use async_trait::async_trait;
use socio_core::{LogId, LogKind, LogRecord, LogStore, StoreError};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::resolve_reference;

/// Records keyed by id. Id assignment happens under the write lock, so
/// concurrent appends always get distinct ids.
pub struct InMemoryLogStore {
    records: RwLock<BTreeMap<LogId, LogRecord>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, mut record: LogRecord) -> Result<LogId, StoreError> {
        let mut records = self.records.write().await;
        let mut id = record.base_id();
        while records.contains_key(&id) {
            id = id.next();
        }
        record.set_id(&id);
        records.insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, reference: &str) -> Result<LogRecord, StoreError> {
        let id = resolve_reference(reference)?;
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self, kind: LogKind) -> Result<Vec<LogRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|(id, _)| id.kind() == kind)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }

    async fn discard(&self, reference: &str) -> Result<(), StoreError> {
        let id = resolve_reference(reference)?;
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encryption, image, processing};
    use socio_core::TextAction;

    #[tokio::test]
    async fn append_assigns_suffixes_on_collision() {
        let store = InMemoryLogStore::new();
        let a = store.append(encryption(5)).await.unwrap();
        let b = store.append(encryption(5)).await.unwrap();
        assert_eq!(a.to_string(), "encryption_log_20250102_030405");
        assert_eq!(b.to_string(), "encryption_log_20250102_030405_1");
        assert_eq!(store.get(&b.to_string()).await.unwrap().id(), b.to_string());
    }

    #[tokio::test]
    async fn kinds_share_seconds_without_colliding() {
        let store = InMemoryLogStore::new();
        let p = store.append(processing(5, TextAction::Keep)).await.unwrap();
        let e = store.append(encryption(5)).await.unwrap();
        assert_eq!(p.seq(), 0);
        assert_eq!(e.seq(), 0);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryLogStore::new();
        store.append(image(1)).await.unwrap();
        store.append(image(3)).await.unwrap();
        store.append(image(3)).await.unwrap();
        store.append(processing(9, TextAction::Keep)).await.unwrap();

        let ids: Vec<String> = store
            .list(LogKind::Image)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "image_log_20250102_030403_1",
                "image_log_20250102_030403",
                "image_log_20250102_030401",
            ]
        );
    }

    #[tokio::test]
    async fn discard_frees_the_record() {
        let store = InMemoryLogStore::new();
        let id = store.append(encryption(5)).await.unwrap();
        store.discard(&id.to_string()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(matches!(
            store.get(&id.to_string()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.discard(&id.to_string()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unsafe_references_are_not_found() {
        let store = InMemoryLogStore::new();
        store.append(encryption(5)).await.unwrap();
        for reference in ["../../etc/passwd", "", "encryption_log_20250102_030405/x"] {
            assert!(matches!(
                store.get(reference).await,
                Err(StoreError::NotFound(_))
            ));
        }
    }
}
