//! Read-path resolution
//!
//! A world token is resolved in this order:
//! 1. it parses as an integer: a numeric world id (an integer outside
//!    the world id range is rejected, never read as a datacenter)
//! 2. capitalized, it names a known world: that world's id
//! 3. otherwise: a datacenter name
//!
//! Item ids arrive as a comma-separated list. The result always holds
//! exactly one record per requested id; ids with no stored data get an
//! empty placeholder and are listed in `unresolvedItems`. A single
//! requested id collapses to the bare record.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use types::ids::{ItemId, WorldId};
use types::market::{ExtendedHistory, MarketSnapshot};

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::history::HistoryStore;
use crate::reference::WorldTable;
use crate::snapshot::SnapshotStore;

/// What a world token resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldScope {
    World(WorldId),
    Datacenter(String),
}

impl WorldScope {
    fn world_id(&self) -> Option<WorldId> {
        match self {
            WorldScope::World(id) => Some(*id),
            WorldScope::Datacenter(_) => None,
        }
    }

    fn dc_name(&self) -> Option<String> {
        match self {
            WorldScope::World(_) => None,
            WorldScope::Datacenter(name) => Some(name.clone()),
        }
    }
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn resolve_world(token: &str, worlds: &WorldTable) -> Result<WorldScope, QueryError> {
    let token = token.trim();
    if let Ok(id) = token.parse::<i64>() {
        return u32::try_from(id)
            .map(|id| WorldScope::World(WorldId::new(id)))
            .map_err(|_| QueryError::InvalidWorld(token.to_string()));
    }
    Ok(match worlds.world_id(&capitalize(token)) {
        Some(id) => WorldScope::World(id),
        None => WorldScope::Datacenter(token.to_string()),
    })
}

/// Parse `"5333,5334"` into item ids. Every element must be an integer.
pub fn parse_item_ids(raw: &str) -> Result<Vec<ItemId>, QueryError> {
    let ids = raw
        .split(',')
        .map(|part| {
            part.parse::<ItemId>()
                .map_err(|_| QueryError::InvalidItemId(part.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(QueryError::NoItems);
    }
    Ok(ids)
}

/// Multi-item result with the ids that had no stored data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemList<T> {
    pub items: Vec<T>,
    pub unresolved_items: Vec<ItemId>,
}

/// Bare record for one requested id, list form for several.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved<T> {
    Single(T),
    Many(ItemList<T>),
}

impl<T> Resolved<T> {
    /// `records` holds one slot per requested id, `None` where nothing was stored.
    fn collapse(
        item_ids: &[ItemId],
        records: Vec<Option<T>>,
        placeholder: impl Fn(ItemId) -> T,
    ) -> Self {
        let mut items = Vec::with_capacity(records.len());
        let mut unresolved_items = Vec::new();
        for (item_id, record) in item_ids.iter().zip(records) {
            match record {
                Some(record) => items.push(record),
                None => {
                    unresolved_items.push(*item_id);
                    items.push(placeholder(*item_id));
                }
            }
        }

        if item_ids.len() == 1 {
            if let Some(only) = items.pop() {
                return Resolved::Single(only);
            }
        }
        Resolved::Many(ItemList {
            items,
            unresolved_items,
        })
    }
}

#[derive(Clone)]
pub struct QueryResolver {
    snapshots: SnapshotStore,
    history: HistoryStore,
    worlds: Arc<WorldTable>,
    config: QueryConfig,
}

impl QueryResolver {
    pub fn new(
        snapshots: SnapshotStore,
        history: HistoryStore,
        worlds: Arc<WorldTable>,
        config: QueryConfig,
    ) -> Self {
        Self {
            snapshots,
            history,
            worlds,
            config,
        }
    }

    /// Worlds a scope covers. Unknown datacenters cover none.
    fn worlds_for(&self, scope: &WorldScope) -> Vec<WorldId> {
        match scope {
            WorldScope::World(id) => vec![*id],
            WorldScope::Datacenter(name) => self.worlds.worlds_in(name),
        }
    }

    /// Every (item, world) key to read. Repeated item ids are read once.
    fn pairs(item_ids: &[ItemId], worlds: &[WorldId]) -> Vec<(ItemId, WorldId)> {
        let mut seen = HashSet::new();
        item_ids
            .iter()
            .filter(|item| seen.insert(**item))
            .flat_map(|item| worlds.iter().map(move |world| (*item, *world)))
            .collect()
    }

    pub async fn get_snapshot(
        &self,
        world_token: &str,
        item_ids: &[ItemId],
    ) -> Result<Resolved<MarketSnapshot>, QueryError> {
        if item_ids.is_empty() {
            return Err(QueryError::NoItems);
        }
        let scope = resolve_world(world_token, &self.worlds)?;
        let worlds = self.worlds_for(&scope);
        debug!(?scope, items = item_ids.len(), worlds = worlds.len(), "Resolving snapshots");

        let found = self
            .snapshots
            .find_many(&Self::pairs(item_ids, &worlds))
            .await?;
        let mut by_item: HashMap<ItemId, Vec<MarketSnapshot>> = HashMap::new();
        for snapshot in found {
            by_item.entry(snapshot.item_id).or_default().push(snapshot);
        }

        let records: Vec<Option<MarketSnapshot>> = item_ids
            .iter()
            .map(|item_id| {
                let parts = by_item.get(item_id)?;
                Some(match &scope {
                    WorldScope::World(_) => parts[0].clone(),
                    WorldScope::Datacenter(dc) => merge_snapshots(*item_id, dc, parts),
                })
            })
            .collect();

        Ok(Resolved::collapse(item_ids, records, |item_id| {
            MarketSnapshot::empty(item_id, scope.world_id(), scope.dc_name())
        }))
    }

    /// History for each item, at most `min(entries, cap)` entries each.
    pub async fn get_history(
        &self,
        world_token: &str,
        item_ids: &[ItemId],
        entries: Option<usize>,
    ) -> Result<Resolved<ExtendedHistory>, QueryError> {
        if item_ids.is_empty() {
            return Err(QueryError::NoItems);
        }
        let limit = entries
            .unwrap_or(usize::MAX)
            .min(self.config.max_history_entries);
        let scope = resolve_world(world_token, &self.worlds)?;
        let worlds = self.worlds_for(&scope);
        debug!(?scope, items = item_ids.len(), limit, "Resolving history");

        let found = self.history.find_many(&Self::pairs(item_ids, &worlds)).await?;
        let mut by_item: HashMap<ItemId, Vec<ExtendedHistory>> = HashMap::new();
        for log in found {
            by_item.entry(log.item_id).or_default().push(log);
        }

        let records: Vec<Option<ExtendedHistory>> = item_ids
            .iter()
            .map(|item_id| {
                let parts = by_item.get(item_id)?;
                Some(match &scope {
                    WorldScope::World(_) => truncate_history(parts[0].clone(), limit),
                    WorldScope::Datacenter(dc) => merge_history(*item_id, dc, parts, limit),
                })
            })
            .collect();

        Ok(Resolved::collapse(item_ids, records, |item_id| {
            ExtendedHistory::empty(item_id, scope.world_id(), scope.dc_name())
        }))
    }
}

/// Datacenter view: every world's listings, cheapest first, tagged with their world.
fn merge_snapshots(item_id: ItemId, dc: &str, parts: &[MarketSnapshot]) -> MarketSnapshot {
    let mut listings = Vec::new();
    let mut last_upload_time = 0;
    for part in parts {
        last_upload_time = last_upload_time.max(part.last_upload_time);
        listings.extend(part.listings.iter().cloned().map(|mut listing| {
            listing.world_id = part.world_id;
            listing
        }));
    }
    listings.sort_by_key(|listing| listing.price_per_unit);
    MarketSnapshot::new(item_id, None, Some(dc.to_string()), last_upload_time, listings)
}

fn truncate_history(log: ExtendedHistory, limit: usize) -> ExtendedHistory {
    let mut entries = log.entries;
    entries.truncate(limit);
    ExtendedHistory::new(log.item_id, log.world_id, log.dc_name, log.last_upload_time, entries)
}

/// Datacenter view: every world's sales, newest first, tagged with their world.
fn merge_history(item_id: ItemId, dc: &str, parts: &[ExtendedHistory], limit: usize) -> ExtendedHistory {
    let mut entries = Vec::new();
    let mut last_upload_time = 0;
    for part in parts {
        last_upload_time = last_upload_time.max(part.last_upload_time);
        entries.extend(part.entries.iter().cloned().map(|mut entry| {
            entry.world_id = part.world_id;
            entry
        }));
    }
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    ExtendedHistory::new(item_id, None, Some(dc.to_string()), last_upload_time, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash;
    use crate::reference::sample_table;
    use crate::store::MemoryStore;
    use serde_json::json;
    use types::market::{line_total, HistoryEntry, Listing};

    fn listing(price: u64) -> Listing {
        Listing {
            listing_id: hash(&price.to_string()),
            seller_id: hash("seller"),
            creator_id: None,
            creator_name: None,
            retainer_id: hash("retainer"),
            retainer_name: None,
            retainer_city: None,
            hq: false,
            on_mannequin: false,
            materia: vec![],
            price_per_unit: price,
            quantity: 1,
            total: line_total(price, 1),
            last_review_time: 0,
            stain_id: 0,
            world_id: None,
        }
    }

    fn sale(price: u64, timestamp: i64) -> HistoryEntry {
        HistoryEntry {
            seller_id: hash("seller"),
            buyer_name: "Buyer".to_string(),
            hq: false,
            price_per_unit: price,
            quantity: 1,
            total: price,
            timestamp,
            world_id: None,
        }
    }

    fn resolver() -> (SnapshotStore, HistoryStore, QueryResolver) {
        let store = Arc::new(MemoryStore::new());
        let worlds = Arc::new(sample_table());
        let snapshots = SnapshotStore::new(store.clone(), worlds.clone());
        let history = HistoryStore::new(store, worlds.clone());
        let resolver = QueryResolver::new(
            snapshots.clone(),
            history.clone(),
            worlds,
            QueryConfig::default(),
        );
        (snapshots, history, resolver)
    }

    #[test]
    fn test_resolve_world_precedence() {
        let worlds = sample_table();
        assert_eq!(resolve_world("74", &worlds).unwrap(), WorldScope::World(WorldId::new(74)));
        assert_eq!(resolve_world("coeurl", &worlds).unwrap(), WorldScope::World(WorldId::new(74)));
        assert_eq!(resolve_world("COEURL", &worlds).unwrap(), WorldScope::World(WorldId::new(74)));
        assert_eq!(
            resolve_world("Crystal", &worlds).unwrap(),
            WorldScope::Datacenter("Crystal".to_string())
        );
        // Unknown numbers are still world ids, never datacenters.
        assert_eq!(resolve_world("9999", &worlds).unwrap(), WorldScope::World(WorldId::new(9999)));
    }

    #[test]
    fn test_out_of_range_integer_world_rejected() {
        let worlds = sample_table();
        for token in ["-1", "4294967296"] {
            assert_eq!(
                resolve_world(token, &worlds).unwrap_err(),
                QueryError::InvalidWorld(token.to_string())
            );
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("gILGAMESH"), "Gilgamesh");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_parse_item_ids() {
        assert_eq!(
            parse_item_ids("1,2, 3").unwrap(),
            vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)]
        );
        assert_eq!(
            parse_item_ids("1,x").unwrap_err(),
            QueryError::InvalidItemId("x".to_string())
        );
        assert!(matches!(parse_item_ids(""), Err(QueryError::InvalidItemId(_))));
    }

    #[tokio::test]
    async fn test_gap_filling_multi_item() {
        let (snapshots, _, resolver) = resolver();
        snapshots
            .replace(&hash("u"), ItemId::new(2), WorldId::new(74), vec![listing(100)])
            .await
            .unwrap();

        let ids = [ItemId::new(1), ItemId::new(2), ItemId::new(3)];
        let Resolved::Many(list) = resolver.get_snapshot("74", &ids).await.unwrap() else {
            panic!("expected list form");
        };

        assert_eq!(list.items.len(), 3);
        assert_eq!(list.unresolved_items, vec![ItemId::new(1), ItemId::new(3)]);
        assert!(list.items[0].listings.is_empty());
        assert_eq!(list.items[0].world_id, Some(WorldId::new(74)));
        assert_eq!(list.items[1].listings.len(), 1);
        assert_eq!(list.items[2].stats.average_price, 0.0);
    }

    #[tokio::test]
    async fn test_single_unresolved_item_is_bare() {
        let (_, _, resolver) = resolver();
        let result = resolver.get_snapshot("74", &[ItemId::new(42)]).await.unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["itemID"], json!(42));
        assert_eq!(value["listings"], json!([]));
        assert!(value.get("items").is_none());
        assert!(value.get("unresolvedItems").is_none());
    }

    #[tokio::test]
    async fn test_world_name_token() {
        let (snapshots, _, resolver) = resolver();
        snapshots
            .replace(&hash("u"), ItemId::new(5), WorldId::new(74), vec![listing(7)])
            .await
            .unwrap();

        let Resolved::Single(snapshot) = resolver.get_snapshot("coeurl", &[ItemId::new(5)]).await.unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(snapshot.listings.len(), 1);
    }

    #[tokio::test]
    async fn test_datacenter_merges_worlds() {
        let (snapshots, _, resolver) = resolver();
        let item = ItemId::new(5);
        snapshots
            .replace_at(&hash("u"), item, WorldId::new(74), vec![listing(300), listing(100)], 10)
            .await
            .unwrap();
        snapshots
            .replace_at(&hash("u"), item, WorldId::new(91), vec![listing(200)], 20)
            .await
            .unwrap();
        // Different datacenter; must not leak in.
        snapshots
            .replace_at(&hash("u"), item, WorldId::new(57), vec![listing(1)], 30)
            .await
            .unwrap();

        let Resolved::Single(snapshot) = resolver.get_snapshot("Crystal", &[item]).await.unwrap() else {
            panic!("expected single record");
        };
        let prices: Vec<u64> = snapshot.listings.iter().map(|l| l.price_per_unit).collect();
        assert_eq!(prices, vec![100, 200, 300]);
        assert_eq!(snapshot.listings[1].world_id, Some(WorldId::new(91)));
        assert_eq!(snapshot.dc_name.as_deref(), Some("Crystal"));
        assert_eq!(snapshot.world_id, None);
        assert_eq!(snapshot.last_upload_time, 20);
    }

    #[tokio::test]
    async fn test_unknown_datacenter_is_placeholder() {
        let (_, _, resolver) = resolver();
        let Resolved::Single(snapshot) = resolver.get_snapshot("Nowhere", &[ItemId::new(5)]).await.unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(snapshot.dc_name.as_deref(), Some("Nowhere"));
        assert!(snapshot.listings.is_empty());
    }

    #[tokio::test]
    async fn test_history_limit_and_cap() {
        let (_, history, resolver) = resolver();
        let (item, world) = (ItemId::new(9), WorldId::new(57));
        history
            .append(&hash("u"), item, world, vec![sale(1, 1), sale(2, 2), sale(3, 3)])
            .await
            .unwrap();

        let Resolved::Single(log) = resolver.get_history("57", &[item], Some(10_000)).await.unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(log.entries.len(), 3);

        let Resolved::Single(log) = resolver.get_history("57", &[item], Some(2)).await.unwrap() else {
            panic!("expected single record");
        };
        let prices: Vec<u64> = log.entries.iter().map(|e| e.price_per_unit).collect();
        assert_eq!(prices, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_history_never_exceeds_cap() {
        let (_, history, resolver) = resolver();
        let (item, world) = (ItemId::new(9), WorldId::new(57));
        let sales: Vec<HistoryEntry> = (0..600).map(|i| sale(i, i as i64)).collect();
        history.append(&hash("u"), item, world, sales).await.unwrap();

        for requested in [None, Some(10_000)] {
            let Resolved::Single(log) = resolver.get_history("57", &[item], requested).await.unwrap() else {
                panic!("expected single record");
            };
            assert_eq!(log.entries.len(), 500);
        }
    }

    #[tokio::test]
    async fn test_history_multi_item_gap_filled() {
        let (_, history, resolver) = resolver();
        history
            .append(&hash("u"), ItemId::new(2), WorldId::new(57), vec![sale(5, 5)])
            .await
            .unwrap();

        let Resolved::Many(list) = resolver
            .get_history("Faerie", &[ItemId::new(1), ItemId::new(2)], None)
            .await
            .unwrap()
        else {
            panic!("expected list form");
        };
        assert_eq!(list.unresolved_items, vec![ItemId::new(1)]);
        assert!(list.items[0].entries.is_empty());
        assert_eq!(list.items[1].entries.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_world_token_is_not_a_datacenter() {
        let (_, _, resolver) = resolver();
        assert_eq!(
            resolver.get_snapshot("-1", &[ItemId::new(1)]).await.unwrap_err(),
            QueryError::InvalidWorld("-1".to_string())
        );
        assert!(resolver.get_history("-1", &[ItemId::new(1)], None).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let (_, _, resolver) = resolver();
        assert_eq!(
            resolver.get_snapshot("74", &[]).await.unwrap_err(),
            QueryError::NoItems
        );
    }
}
