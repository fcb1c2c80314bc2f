//! Banned uploaders
//!
//! Banning is idempotent: a duplicate-key conflict on insert means the
//! uploader is already banned and is treated as success.

use tracing::{debug, info};
use types::ids::HashedId;
use types::source::BlacklistEntry;

use crate::store::{to_document, Collection, SharedStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct BlacklistRegistry {
    store: SharedStore,
}

impl BlacklistRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn ban(&self, uploader_id: &HashedId) -> StoreResult<()> {
        let entry = BlacklistEntry {
            uploader_id: uploader_id.clone(),
        };
        match self
            .store
            .insert_unique(Collection::Blacklist, uploader_id.as_str(), to_document(&entry)?)
            .await
        {
            Ok(()) => {
                info!(%uploader_id, "Uploader banned");
                Ok(())
            }
            Err(StoreError::Conflict { .. }) => {
                debug!(%uploader_id, "Uploader already banned");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_banned(&self, uploader_id: &HashedId) -> StoreResult<bool> {
        Ok(self
            .store
            .find_one(Collection::Blacklist, uploader_id.as_str())
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ban_and_check() {
        let blacklist = BlacklistRegistry::new(Arc::new(MemoryStore::new()));
        let uploader = hash("uploader-1");

        assert!(!blacklist.is_banned(&uploader).await.unwrap());
        blacklist.ban(&uploader).await.unwrap();
        assert!(blacklist.is_banned(&uploader).await.unwrap());
        assert!(!blacklist.is_banned(&hash("uploader-2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_reban_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let blacklist = BlacklistRegistry::new(store.clone());
        let uploader = hash("uploader-1");

        blacklist.ban(&uploader).await.unwrap();
        blacklist.ban(&uploader).await.unwrap();

        assert!(blacklist.is_banned(&uploader).await.unwrap());
        assert_eq!(store.len(Collection::Blacklist), 1);
    }
}
