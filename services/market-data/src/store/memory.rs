//! In-memory document store
//!
//! Documents live in a `DashMap` keyed by `(Collection, key)`. Each
//! operation runs under the shard lock of its key, which gives the
//! per-key atomicity the registries rely on (no lost increments, no torn
//! appends). The whole map can be loaded from and flushed to a JSON file
//! at startup and shutdown.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

use super::{Collection, DocumentStore, Fields, StoreError, StoreResult};

type Dump = BTreeMap<Collection, BTreeMap<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<(Collection, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously flushed store. A missing file yields an empty store.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No store file yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(StoreError::Unavailable(format!("{}: {}", path.display(), e))),
        };

        let dump: Dump = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))?;

        let store = Self::new();
        for (collection, documents) in dump {
            for (key, document) in documents {
                store.documents.insert((collection, key), document);
            }
        }

        info!(
            path = %path.display(),
            documents = store.documents.len(),
            "Store loaded"
        );
        Ok(store)
    }

    /// Write every document to `path`, replacing it atomically via a sibling temp file.
    pub async fn flush(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let mut dump = Dump::new();
        for entry in self.documents.iter() {
            let (collection, key) = entry.key();
            dump.entry(*collection)
                .or_default()
                .insert(key.clone(), entry.value().clone());
        }

        let bytes =
            serde_json::to_vec(&dump).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = bytes.len(), "Store flushed");
        Ok(())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn object_mut<'a>(
    collection: Collection,
    key: &str,
    document: &'a mut Value,
) -> StoreResult<&'a mut Fields> {
    document.as_object_mut().ok_or_else(|| StoreError::Malformed {
        collection,
        key: key.to_string(),
        reason: "document is not an object".to_string(),
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .documents
            .get(&(collection, key.to_string()))
            .map(|doc| doc.value().clone()))
    }

    async fn find_many(
        &self,
        collection: Collection,
        keys: &[String],
    ) -> StoreResult<Vec<(String, Value)>> {
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.documents
                    .get(&(collection, key.clone()))
                    .map(|doc| (key.clone(), doc.value().clone()))
            })
            .collect())
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        key: &str,
        document: Value,
    ) -> StoreResult<()> {
        match self.documents.entry((collection, key.to_string())) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                collection,
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(document);
                debug!(%collection, key, "Inserted document");
                Ok(())
            }
        }
    }

    async fn upsert(&self, collection: Collection, key: &str, document: Value) -> StoreResult<()> {
        self.documents.insert((collection, key.to_string()), document);
        debug!(%collection, key, "Upserted document");
        Ok(())
    }

    async fn set_fields(
        &self,
        collection: Collection,
        key: &str,
        set: Fields,
        set_on_insert: Fields,
    ) -> StoreResult<()> {
        match self.documents.entry((collection, key.to_string())) {
            Entry::Occupied(mut slot) => {
                let doc = object_mut(collection, key, slot.get_mut())?;
                doc.extend(set);
            }
            Entry::Vacant(slot) => {
                let mut doc = set_on_insert;
                doc.extend(set);
                slot.insert(Value::Object(doc));
            }
        }
        Ok(())
    }

    async fn increment(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        by: i64,
    ) -> StoreResult<i64> {
        let mut slot = self
            .documents
            .entry((collection, key.to_string()))
            .or_insert_with(|| Value::Object(Fields::new()));
        let doc = object_mut(collection, key, slot.value_mut())?;

        let current = match doc.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| StoreError::Malformed {
                collection,
                key: key.to_string(),
                reason: format!("field {} is not an integer", field),
            })?,
        };
        let next = current.saturating_add(by);
        doc.insert(field.to_string(), Value::from(next));
        Ok(next)
    }

    async fn append(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        items: Vec<Value>,
        set: Fields,
    ) -> StoreResult<()> {
        let mut slot = self
            .documents
            .entry((collection, key.to_string()))
            .or_insert_with(|| Value::Object(Fields::new()));
        let doc = object_mut(collection, key, slot.value_mut())?;

        let array = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let array = array.as_array_mut().ok_or_else(|| StoreError::Malformed {
            collection,
            key: key.to_string(),
            reason: format!("field {} is not an array", field),
        })?;
        let appended = items.len();
        array.extend(items);
        doc.extend(set);

        debug!(%collection, key, appended, "Appended to document");
        Ok(())
    }
}
