//! Snapshot store: current listings per (item, world)
//!
//! Each accepted upload replaces the listing set for its pair wholesale.
//! Concurrent replacements for the same pair race and the last write
//! wins; there is no merge and no version check. The contributing
//! uploader is kept on the document but never leaves this module.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::{market_key, HashedId, ItemId, WorldId};
use types::market::{Listing, MarketSnapshot};

use crate::reference::WorldTable;
use crate::store::{from_document, to_document, Collection, SharedStore, StoreResult};

/// Persisted form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(rename = "itemID")]
    item_id: ItemId,
    #[serde(rename = "worldID")]
    world_id: WorldId,
    #[serde(default)]
    dc_name: Option<String>,
    last_upload_time: i64,
    #[serde(rename = "uploaderID")]
    uploader_id: HashedId,
    listings: Vec<Listing>,
}

impl From<StoredSnapshot> for MarketSnapshot {
    fn from(stored: StoredSnapshot) -> Self {
        MarketSnapshot::new(
            stored.item_id,
            Some(stored.world_id),
            stored.dc_name,
            stored.last_upload_time,
            stored.listings,
        )
    }
}

#[derive(Clone)]
pub struct SnapshotStore {
    store: SharedStore,
    worlds: Arc<WorldTable>,
}

impl SnapshotStore {
    pub fn new(store: SharedStore, worlds: Arc<WorldTable>) -> Self {
        Self { store, worlds }
    }

    /// Replace the listing set for `(item_id, world_id)` as of now.
    pub async fn replace(
        &self,
        uploader_id: &HashedId,
        item_id: ItemId,
        world_id: WorldId,
        listings: Vec<Listing>,
    ) -> StoreResult<()> {
        self.replace_at(uploader_id, item_id, world_id, listings, crate::now_millis())
            .await
    }

    pub async fn replace_at(
        &self,
        uploader_id: &HashedId,
        item_id: ItemId,
        world_id: WorldId,
        listings: Vec<Listing>,
        upload_time: i64,
    ) -> StoreResult<()> {
        let count = listings.len();
        let stored = StoredSnapshot {
            item_id,
            world_id,
            dc_name: self.worlds.datacenter_of(world_id).map(str::to_string),
            last_upload_time: upload_time,
            uploader_id: uploader_id.clone(),
            listings,
        };
        let key = market_key(item_id, world_id);
        self.store
            .upsert(Collection::RecentData, &key, to_document(&stored)?)
            .await?;

        debug!(%item_id, %world_id, listings = count, "Snapshot replaced");
        Ok(())
    }

    pub async fn find(&self, item_id: ItemId, world_id: WorldId) -> StoreResult<Option<MarketSnapshot>> {
        let key = market_key(item_id, world_id);
        match self.store.find_one(Collection::RecentData, &key).await? {
            Some(doc) => {
                let stored: StoredSnapshot = from_document(Collection::RecentData, &key, doc)?;
                Ok(Some(stored.into()))
            }
            None => Ok(None),
        }
    }

    /// Snapshots for whichever pairs have one, in request order.
    pub async fn find_many(&self, pairs: &[(ItemId, WorldId)]) -> StoreResult<Vec<MarketSnapshot>> {
        let keys: Vec<String> = pairs
            .iter()
            .map(|(item_id, world_id)| market_key(*item_id, *world_id))
            .collect();

        self.store
            .find_many(Collection::RecentData, &keys)
            .await?
            .into_iter()
            .map(|(key, doc)| {
                from_document::<StoredSnapshot>(Collection::RecentData, &key, doc).map(Into::into)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash;
    use crate::reference::sample_table;
    use crate::store::{DocumentStore, MemoryStore};
    use types::market::line_total;

    fn listing(seed: &str, price: u64, quantity: u32) -> Listing {
        Listing {
            listing_id: hash(seed),
            seller_id: hash("seller"),
            creator_id: None,
            creator_name: None,
            retainer_id: hash("retainer"),
            retainer_name: Some("Retainer".to_string()),
            retainer_city: None,
            hq: false,
            on_mannequin: false,
            materia: vec![],
            price_per_unit: price,
            quantity,
            total: line_total(price, quantity),
            last_review_time: 0,
            stain_id: 0,
            world_id: None,
        }
    }

    fn snapshots() -> (Arc<MemoryStore>, SnapshotStore) {
        let store = Arc::new(MemoryStore::new());
        let snapshots = SnapshotStore::new(store.clone(), Arc::new(sample_table()));
        (store, snapshots)
    }

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let (_, snapshots) = snapshots();
        let (item, world) = (ItemId::new(5333), WorldId::new(74));

        snapshots
            .replace_at(&hash("u1"), item, world, vec![listing("a", 100, 1), listing("b", 200, 1)], 10)
            .await
            .unwrap();
        snapshots
            .replace_at(&hash("u2"), item, world, vec![listing("c", 300, 2)], 20)
            .await
            .unwrap();

        let snapshot = snapshots.find(item, world).await.unwrap().unwrap();
        assert_eq!(snapshot.listings, vec![listing("c", 300, 2)]);
        assert_eq!(snapshot.last_upload_time, 20);
        assert_eq!(snapshot.dc_name.as_deref(), Some("Crystal"));
        assert_eq!(snapshot.stats.min_price, 300);
    }

    #[tokio::test]
    async fn test_uploader_kept_internally_but_not_returned() {
        let (store, snapshots) = snapshots();
        let (item, world) = (ItemId::new(1), WorldId::new(74));
        snapshots
            .replace(&hash("u1"), item, world, vec![listing("a", 1, 1)])
            .await
            .unwrap();

        let raw = store
            .find_one(Collection::RecentData, &market_key(item, world))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw["uploaderID"], hash("u1").as_str());

        let snapshot = snapshots.find(item, world).await.unwrap().unwrap();
        let exposed = serde_json::to_value(&snapshot).unwrap();
        assert!(exposed.get("uploaderID").is_none());
    }

    #[tokio::test]
    async fn test_find_many_skips_missing_pairs() {
        let (_, snapshots) = snapshots();
        let world = WorldId::new(74);
        snapshots
            .replace(&hash("u"), ItemId::new(2), world, vec![])
            .await
            .unwrap();

        let found = snapshots
            .find_many(&[(ItemId::new(1), world), (ItemId::new(2), world), (ItemId::new(3), world)])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, ItemId::new(2));
        assert!(found[0].listings.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_replacements_never_merge() {
        let (_, snapshots) = snapshots();
        let (item, world) = (ItemId::new(5333), WorldId::new(74));
        let set_a = vec![listing("a1", 100, 1), listing("a2", 110, 1)];
        let set_b = vec![listing("b1", 500, 5)];

        let (uploader_a, uploader_b) = (hash("uploader-a"), hash("uploader-b"));

        let (ra, rb) = tokio::join!(
            snapshots.replace(&uploader_a, item, world, set_a.clone()),
            snapshots.replace(&uploader_b, item, world, set_b.clone()),
        );
        ra.unwrap();
        rb.unwrap();

        let snapshot = snapshots.find(item, world).await.unwrap().unwrap();
        assert!(snapshot.listings == set_a || snapshot.listings == set_b);
    }
}
