//! Content identity registry
//!
//! Maps a hashed character or retainer id to the last display name seen
//! for it. Lookups take the hashed id; callers holding a plaintext id
//! hash it first.
//!
//! `kind` is written only when the row is created. Later writes for the
//! same id replace the display name and leave the kind alone.

use serde_json::Value;
use tracing::debug;
use types::content::{ContentIdentity, ContentKind};
use types::ids::HashedId;

use crate::store::{from_document, to_document, Collection, Fields, SharedStore, StoreResult};

#[derive(Clone)]
pub struct ContentIdentityRegistry {
    store: SharedStore,
}

impl ContentIdentityRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &HashedId) -> StoreResult<Option<ContentIdentity>> {
        match self.store.find_one(Collection::Content, id.as_str()).await? {
            Some(doc) => from_document(Collection::Content, id.as_str(), doc).map(Some),
            None => Ok(None),
        }
    }

    pub async fn set(&self, id: &HashedId, kind: ContentKind, display_name: &str) -> StoreResult<()> {
        let mut set = Fields::new();
        set.insert("characterName".to_string(), Value::from(display_name));

        let mut set_on_insert = Fields::new();
        set_on_insert.insert("contentID".to_string(), to_document(id)?);
        set_on_insert.insert("contentType".to_string(), to_document(&kind)?);

        self.store
            .set_fields(Collection::Content, id.as_str(), set, set_on_insert)
            .await?;
        debug!(%id, %kind, "Content identity stored");
        Ok(())
    }
}
