//! Trusted source registry
//!
//! Upload agents authenticate with a provisioned API key. Keys are
//! hashed before every lookup; only the digest is stored.

use serde_json::Value;
use tracing::{debug, info};
use types::source::TrustedSource;

use crate::hashing::hash;
use crate::store::{from_document, to_document, Collection, SharedStore, StoreError, StoreResult};

const UPLOAD_COUNT: &str = "uploadCount";

#[derive(Clone)]
pub struct TrustedSourceRegistry {
    store: SharedStore,
}

impl TrustedSourceRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Provision an API key. Returns `false` if the key was already registered.
    pub async fn register(&self, api_key: &str, source_name: &str) -> StoreResult<bool> {
        let source = TrustedSource {
            api_key_hash: hash(api_key),
            source_name: source_name.to_string(),
            upload_count: 0,
        };
        let key = source.api_key_hash.to_string();

        match self
            .store
            .insert_unique(Collection::TrustedSources, &key, to_document(&source)?)
            .await
        {
            Ok(()) => {
                info!(source_name, "Trusted source registered");
                Ok(true)
            }
            Err(StoreError::Conflict { .. }) => {
                debug!(source_name, "Trusted source already registered");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Look up the source holding `api_key`.
    pub async fn authenticate(&self, api_key: &str) -> StoreResult<Option<TrustedSource>> {
        let key = hash(api_key).to_string();
        match self.store.find_one(Collection::TrustedSources, &key).await? {
            // A bare usage counter without a name was never provisioned.
            Some(doc) if doc.get("sourceName").map_or(false, Value::is_string) => {
                from_document(Collection::TrustedSources, &key, doc).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Bump the source's upload counter. Returns the new count.
    pub async fn record_usage(&self, api_key: &str) -> StoreResult<u64> {
        let key = hash(api_key).to_string();
        let count = self
            .store
            .increment(Collection::TrustedSources, &key, UPLOAD_COUNT, 1)
            .await?;
        Ok(count.max(0) as u64)
    }
}
