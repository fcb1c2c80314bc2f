//! History store: append-only sale log per (item, world)
//!
//! Entries are appended in upload order and never replaced. Entries are
//! not deduplicated on write, so an uploader that resubmits the same
//! sales produces duplicate rows.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::{market_key, HashedId, ItemId, WorldId};
use types::market::{ExtendedHistory, HistoryEntry};

use crate::reference::WorldTable;
use crate::store::{from_document, to_document, Collection, Fields, SharedStore, StoreResult};

const ENTRIES: &str = "entries";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(flatten)]
    entry: HistoryEntry,
    #[serde(rename = "uploaderID")]
    uploader_id: HashedId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHistory {
    #[serde(rename = "itemID")]
    item_id: ItemId,
    #[serde(rename = "worldID")]
    world_id: WorldId,
    #[serde(default)]
    dc_name: Option<String>,
    last_upload_time: i64,
    #[serde(default)]
    entries: Vec<StoredEntry>,
}

/// Document header rewritten on every append.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryHeader<'a> {
    #[serde(rename = "itemID")]
    item_id: ItemId,
    #[serde(rename = "worldID")]
    world_id: WorldId,
    dc_name: Option<&'a str>,
    last_upload_time: i64,
}

impl From<StoredHistory> for ExtendedHistory {
    fn from(stored: StoredHistory) -> Self {
        ExtendedHistory::new(
            stored.item_id,
            Some(stored.world_id),
            stored.dc_name,
            stored.last_upload_time,
            stored.entries.into_iter().map(|e| e.entry).collect(),
        )
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    store: SharedStore,
    worlds: Arc<WorldTable>,
}

impl HistoryStore {
    pub fn new(store: SharedStore, worlds: Arc<WorldTable>) -> Self {
        Self { store, worlds }
    }

    pub async fn append(
        &self,
        uploader_id: &HashedId,
        item_id: ItemId,
        world_id: WorldId,
        entries: Vec<HistoryEntry>,
    ) -> StoreResult<()> {
        self.append_at(uploader_id, item_id, world_id, entries, crate::now_millis())
            .await
    }

    pub async fn append_at(
        &self,
        uploader_id: &HashedId,
        item_id: ItemId,
        world_id: WorldId,
        entries: Vec<HistoryEntry>,
        upload_time: i64,
    ) -> StoreResult<()> {
        let count = entries.len();
        let items = entries
            .into_iter()
            .map(|entry| {
                to_document(&StoredEntry {
                    entry,
                    uploader_id: uploader_id.clone(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let header = HistoryHeader {
            item_id,
            world_id,
            dc_name: self.worlds.datacenter_of(world_id),
            last_upload_time: upload_time,
        };
        let set: Fields = crate::store::to_fields(&header)?;

        let key = market_key(item_id, world_id);
        self.store
            .append(Collection::ExtendedHistory, &key, ENTRIES, items, set)
            .await?;

        debug!(%item_id, %world_id, appended = count, "History appended");
        Ok(())
    }

    /// Full logs for whichever pairs have one, in request order, with
    /// uploader ids stripped from every entry.
    pub async fn find_many(&self, pairs: &[(ItemId, WorldId)]) -> StoreResult<Vec<ExtendedHistory>> {
        let keys: Vec<String> = pairs
            .iter()
            .map(|(item_id, world_id)| market_key(*item_id, *world_id))
            .collect();

        self.store
            .find_many(Collection::ExtendedHistory, &keys)
            .await?
            .into_iter()
            .map(|(key, doc)| {
                from_document::<StoredHistory>(Collection::ExtendedHistory, &key, doc).map(Into::into)
            })
            .collect()
    }
}
