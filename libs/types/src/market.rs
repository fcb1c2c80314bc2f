//! Listings, sale history and the read records built from them
//!
//! Field names follow the wire format uploaders and readers already use
//! (`camelCase`, with `ID` suffixes kept upper-case).

use serde::{Deserialize, Serialize};

use crate::ids::{HashedId, ItemId, WorldId};
use crate::world::City;

/// A materia melded into a listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materia {
    #[serde(rename = "slotID")]
    pub slot_id: u32,
    #[serde(rename = "materiaID")]
    pub materia_id: u32,
}

/// One active listing on a world's market board, post-anonymization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "listingID")]
    pub listing_id: HashedId,
    #[serde(rename = "sellerID")]
    pub seller_id: HashedId,
    #[serde(rename = "creatorID", default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<HashedId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(rename = "retainerID")]
    pub retainer_id: HashedId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retainer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retainer_city: Option<City>,
    pub hq: bool,
    pub on_mannequin: bool,
    #[serde(default)]
    pub materia: Vec<Materia>,
    pub price_per_unit: u64,
    pub quantity: u32,
    /// `price_per_unit * quantity`
    pub total: u64,
    pub last_review_time: i64,
    #[serde(rename = "stainID")]
    pub stain_id: u32,
    /// World the listing was posted on; only set on datacenter-wide reads.
    #[serde(rename = "worldID", default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,
}

/// One completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "sellerID")]
    pub seller_id: HashedId,
    pub buyer_name: String,
    pub hq: bool,
    pub price_per_unit: u64,
    pub quantity: u32,
    /// `price_per_unit * quantity`
    pub total: u64,
    pub timestamp: i64,
    /// World the sale happened on; only set on datacenter-wide reads.
    #[serde(rename = "worldID", default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,
}

/// Line total for a listing or sale. Saturates instead of wrapping.
pub fn line_total(price_per_unit: u64, quantity: u32) -> u64 {
    price_per_unit.saturating_mul(u64::from(quantity))
}

/// Summary prices over a set of listings or sales. All zero when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub min_price: u64,
    pub max_price: u64,
    pub average_price: f64,
    pub total_quantity: u64,
}

impl PriceStats {
    /// Build from `(price_per_unit, quantity)` pairs.
    pub fn from_lines(lines: impl IntoIterator<Item = (u64, u32)>) -> Self {
        let mut stats = PriceStats::default();
        let mut count = 0u64;
        let mut sum = 0f64;

        for (price, quantity) in lines {
            if count == 0 {
                stats.min_price = price;
                stats.max_price = price;
            } else {
                stats.min_price = stats.min_price.min(price);
                stats.max_price = stats.max_price.max(price);
            }
            stats.total_quantity += u64::from(quantity);
            sum += price as f64;
            count += 1;
        }

        if count > 0 {
            stats.average_price = sum / count as f64;
        }
        stats
    }
}

/// Current listings for one item, scoped to a world or a datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    #[serde(rename = "worldID", default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc_name: Option<String>,
    pub last_upload_time: i64,
    pub listings: Vec<Listing>,
    #[serde(flatten)]
    pub stats: PriceStats,
}

impl MarketSnapshot {
    pub fn new(
        item_id: ItemId,
        world_id: Option<WorldId>,
        dc_name: Option<String>,
        last_upload_time: i64,
        listings: Vec<Listing>,
    ) -> Self {
        let stats = PriceStats::from_lines(listings.iter().map(|l| (l.price_per_unit, l.quantity)));
        Self {
            item_id,
            world_id,
            dc_name,
            last_upload_time,
            listings,
            stats,
        }
    }

    /// Stand-in for an item nobody has uploaded yet.
    pub fn empty(item_id: ItemId, world_id: Option<WorldId>, dc_name: Option<String>) -> Self {
        Self::new(item_id, world_id, dc_name, 0, Vec::new())
    }
}

/// Sale history for one item, scoped to a world or a datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedHistory {
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    #[serde(rename = "worldID", default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc_name: Option<String>,
    pub last_upload_time: i64,
    pub entries: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub stats: PriceStats,
}

impl ExtendedHistory {
    pub fn new(
        item_id: ItemId,
        world_id: Option<WorldId>,
        dc_name: Option<String>,
        last_upload_time: i64,
        entries: Vec<HistoryEntry>,
    ) -> Self {
        let stats = PriceStats::from_lines(entries.iter().map(|e| (e.price_per_unit, e.quantity)));
        Self {
            item_id,
            world_id,
            dc_name,
            last_upload_time,
            entries,
            stats,
        }
    }

    pub fn empty(item_id: ItemId, world_id: Option<WorldId>, dc_name: Option<String>) -> Self {
        Self::new(item_id, world_id, dc_name, 0, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(price: u64, quantity: u32) -> Listing {
        Listing {
            listing_id: HashedId::from_digest("l"),
            seller_id: HashedId::from_digest("s"),
            creator_id: None,
            creator_name: None,
            retainer_id: HashedId::from_digest("r"),
            retainer_name: Some("Retainer".to_string()),
            retainer_city: Some(City::Kugane),
            hq: false,
            on_mannequin: false,
            materia: vec![],
            price_per_unit: price,
            quantity,
            total: line_total(price, quantity),
            last_review_time: 1_600_000_000,
            stain_id: 0,
            world_id: None,
        }
    }

    #[test]
    fn test_line_total_saturates() {
        assert_eq!(line_total(250, 4), 1000);
        assert_eq!(line_total(u64::MAX, 2), u64::MAX);
    }

    #[test]
    fn test_price_stats_empty_is_zero() {
        let stats = PriceStats::from_lines(Vec::new());
        assert_eq!(stats, PriceStats::default());
        assert_eq!(stats.average_price, 0.0);
    }

    #[test]
    fn test_price_stats_over_lines() {
        let stats = PriceStats::from_lines(vec![(100, 1), (300, 2), (200, 3)]);
        assert_eq!(stats.min_price, 100);
        assert_eq!(stats.max_price, 300);
        assert_eq!(stats.average_price, 200.0);
        assert_eq!(stats.total_quantity, 6);
    }

    #[test]
    fn test_snapshot_wire_names() {
        let snapshot = MarketSnapshot::new(
            ItemId::new(5333),
            Some(WorldId::new(74)),
            Some("Primal".to_string()),
            42,
            vec![listing(100, 3)],
        );
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["itemID"], json!(5333));
        assert_eq!(value["worldID"], json!(74));
        assert_eq!(value["dcName"], json!("Primal"));
        assert_eq!(value["lastUploadTime"], json!(42));
        assert_eq!(value["minPrice"], json!(100));
        assert_eq!(value["listings"][0]["pricePerUnit"], json!(100));
        assert_eq!(value["listings"][0]["total"], json!(300));
        assert_eq!(value["listings"][0]["retainerCity"], json!(7));
        assert!(value["listings"][0].get("worldID").is_none());
        assert!(value["listings"][0].get("creatorID").is_none());
    }

    #[test]
    fn test_empty_history_has_no_entries() {
        let history = ExtendedHistory::empty(ItemId::new(1), None, Some("Aether".to_string()));
        let value = serde_json::to_value(&history).unwrap();

        assert_eq!(value["entries"], json!([]));
        assert_eq!(value["dcName"], json!("Aether"));
        assert!(value.get("worldID").is_none());
        assert_eq!(value["totalQuantity"], json!(0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_price_stats_bounds(
            lines in prop::collection::vec((0u64..10_000_000, 0u32..10_000), 1..50),
        ) {
            let stats = PriceStats::from_lines(lines.iter().copied());
            prop_assert!(stats.min_price <= stats.max_price);
            prop_assert!(stats.average_price >= stats.min_price as f64);
            prop_assert!(stats.average_price <= stats.max_price as f64);
            prop_assert_eq!(
                stats.total_quantity,
                lines.iter().map(|(_, q)| u64::from(*q)).sum::<u64>()
            );
        }
    }
}
