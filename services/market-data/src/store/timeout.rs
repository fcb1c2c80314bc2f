//! Bounded timeout at the store-access boundary
//!
//! Nothing above the store enforces a deadline, so a stalled store call
//! would otherwise block its upload or query indefinitely.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use super::{Collection, DocumentStore, Fields, StoreError, StoreResult};

pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S: DocumentStore> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        collection: Collection,
        call: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = self.limit.as_millis() as u64;
                error!(operation, %collection, after_ms, "Store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    after_ms,
                })
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn find_one(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>> {
        self.bounded("find_one", collection, self.inner.find_one(collection, key))
            .await
    }

    async fn find_many(
        &self,
        collection: Collection,
        keys: &[String],
    ) -> StoreResult<Vec<(String, Value)>> {
        self.bounded("find_many", collection, self.inner.find_many(collection, keys))
            .await
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        key: &str,
        document: Value,
    ) -> StoreResult<()> {
        self.bounded(
            "insert_unique",
            collection,
            self.inner.insert_unique(collection, key, document),
        )
        .await
    }

    async fn upsert(&self, collection: Collection, key: &str, document: Value) -> StoreResult<()> {
        self.bounded("upsert", collection, self.inner.upsert(collection, key, document))
            .await
    }

    async fn set_fields(
        &self,
        collection: Collection,
        key: &str,
        set: Fields,
        set_on_insert: Fields,
    ) -> StoreResult<()> {
        self.bounded(
            "set_fields",
            collection,
            self.inner.set_fields(collection, key, set, set_on_insert),
        )
        .await
    }

    async fn increment(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        by: i64,
    ) -> StoreResult<i64> {
        self.bounded(
            "increment",
            collection,
            self.inner.increment(collection, key, field, by),
        )
        .await
    }

    async fn append(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
        items: Vec<Value>,
        set: Fields,
    ) -> StoreResult<()> {
        self.bounded(
            "append",
            collection,
            self.inner.append(collection, key, field, items, set),
        )
        .await
    }
}
