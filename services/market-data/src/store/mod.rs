//! Durable keyed-document store interface
//!
//! The core never talks to a storage engine directly. Every registry and
//! store goes through `DocumentStore`, a narrow interface over JSON
//! documents addressed by `(Collection, key)`:
//!
//! - unique insert (conflict on duplicate key)
//! - whole-document upsert
//! - field-level set with set-on-insert
//! - atomic integer increment
//! - array append
//! - exact-key and key-set find
//!
//! Each call is atomic for its single key. Nothing here spans keys, so
//! there are no cross-document transactions.

pub mod memory;
pub mod timeout;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use timeout::TimeoutStore;

/// Field map used by `set_fields` and `append`.
pub type Fields = serde_json::Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = Arc<dyn DocumentStore>;

/// Logical collections of the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    TrustedSources,
    Blacklist,
    Content,
    /// Current listings, one document per (item, world).
    RecentData,
    /// Sale logs, one document per (item, world).
    ExtendedHistory,
    /// Daily counters and recency indexes.
    ExtraData,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::TrustedSources,
        Collection::Blacklist,
        Collection::Content,
        Collection::RecentData,
        Collection::ExtendedHistory,
        Collection::ExtraData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::TrustedSources => "trustedSources",
            Collection::Blacklist => "blacklist",
            Collection::Content => "content",
            Collection::RecentData => "recentData",
            Collection::ExtendedHistory => "extendedHistory",
            Collection::ExtraData => "extraData",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Duplicate key on a unique insert. Idempotent registries swallow this.
    #[error("duplicate key {key} in {collection}")]
    Conflict { collection: Collection, key: String },

    #[error("store call {operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document {key} in {collection}: {reason}")]
    Malformed {
        collection: Collection,
        key: String,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>>;

    /// Documents for whichever of `keys` exist, in the order of `keys`.
    async fn find_many(
        &self,
        collection: Collection,
        keys: &[String],
    ) -> StoreResult<Vec<(String, Value)>>;

    /// Insert a new document. Fails with `StoreError::Conflict` if the key exists.
    async fn insert_unique(&self, collection: Collection, key: &str, document: Value)
        -> StoreResult<()>;

    /// Replace the whole document, creating it if absent.
    async fn upsert(&self, collection: Collection, key: &str, document: Value) -> StoreResult<()>;

    /// Overwrite `set` fields; `set_on_insert` fields are only written when
    /// the document is created by this call.
    async fn set_fields(
        &self,
        collection: Collection,
        key: &str,
        set: Fields,
        set_on_insert: Fields,
    ) -> StoreResult<()>;

    /// Add `by` to an integer field, creating document and field at `by`.
    /// Returns the new value.
    async fn increment(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        by: i64,
    ) -> StoreResult<i64>;

    /// Push `items` onto an array field (created empty if absent) and
    /// overwrite `set` fields in the same step.
    async fn append(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        items: Vec<Value>,
        set: Fields,
    ) -> StoreResult<()>;
}

pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Serialize a struct into a field map for `set_fields` / `append`.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match to_document(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    key: &str,
    document: Value,
) -> StoreResult<T> {
    serde_json::from_value(document).map_err(|e| StoreError::Malformed {
        collection,
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        count: u64,
    }

    #[test]
    fn test_collection_names_match_layout() {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "trustedSources",
                "blacklist",
                "content",
                "recentData",
                "extendedHistory",
                "extraData"
            ]
        );
        assert_eq!(
            serde_json::to_string(&Collection::RecentData).unwrap(),
            "\"recentData\""
        );
    }

    #[test]
    fn test_to_fields_requires_object() {
        let fields = to_fields(&Row {
            name: "a".to_string(),
            count: 1,
        })
        .unwrap();
        assert_eq!(fields.get("count"), Some(&json!(1)));

        assert!(matches!(to_fields(&5u32), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_from_document_reports_key() {
        let err = from_document::<Row>(Collection::Content, "k1", json!({"name": 3})).unwrap_err();
        match err {
            StoreError::Malformed {
                collection, key, ..
            } => {
                assert_eq!(collection, Collection::Content);
                assert_eq!(key, "k1");
            }
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }
}
