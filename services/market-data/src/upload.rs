//! Upload payloads
//!
//! `RawUpload` is the payload as agents send it. Every section is
//! optional and every field is read leniently: ids and names that are
//! not strings are treated as absent, missing booleans become `false`,
//! missing arrays become empty and numbers that are null, negative where
//! unsigned, fractional or not numbers at all become `0`. Only a section
//! of the wrong shape (e.g. `listings` not an array) rejects the upload. `Upload` is the normalized form the
//! coordinator writes: every id hashed, every line total computed.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use types::content::ContentKind;
use types::ids::{HashedId, ItemId, WorldId};
use types::market::{line_total, HistoryEntry, Listing, Materia};
use types::world::City;

use crate::hashing::{hash, hash_opt};

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_city<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<City>, D::Error> {
    Ok(City::from_value(&Value::deserialize(deserializer)?))
}

/// Integer field that falls back to zero. Integral floats (`100.0`) are accepted.
fn lenient_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    Ok(number.and_then(|n| T::try_from(n).ok()).unwrap_or_default())
}

/// Materia list that falls back to absent when any element is malformed.
fn lenient_materia<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<Materia>>, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawListing {
    #[serde(rename = "listingID", deserialize_with = "lenient_string")]
    pub listing_id: Option<String>,
    #[serde(rename = "sellerID", deserialize_with = "lenient_string")]
    pub seller_id: Option<String>,
    #[serde(rename = "creatorID", deserialize_with = "lenient_string")]
    pub creator_id: Option<String>,
    #[serde(rename = "creatorName", deserialize_with = "lenient_string")]
    pub creator_name: Option<String>,
    #[serde(rename = "retainerID", deserialize_with = "lenient_string")]
    pub retainer_id: Option<String>,
    #[serde(rename = "retainerName", deserialize_with = "lenient_string")]
    pub retainer_name: Option<String>,
    #[serde(rename = "retainerCity", deserialize_with = "lenient_city")]
    pub retainer_city: Option<City>,
    #[serde(deserialize_with = "lenient_bool")]
    pub hq: bool,
    #[serde(rename = "onMannequin", deserialize_with = "lenient_bool")]
    pub on_mannequin: bool,
    #[serde(deserialize_with = "lenient_materia")]
    pub materia: Option<Vec<Materia>>,
    #[serde(rename = "pricePerUnit", deserialize_with = "lenient_int")]
    pub price_per_unit: u64,
    #[serde(deserialize_with = "lenient_int")]
    pub quantity: u32,
    #[serde(rename = "lastReviewTime", deserialize_with = "lenient_int")]
    pub last_review_time: i64,
    #[serde(rename = "stainID", deserialize_with = "lenient_int")]
    pub stain_id: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawHistoryEntry {
    #[serde(rename = "sellerID", deserialize_with = "lenient_string")]
    pub seller_id: Option<String>,
    #[serde(rename = "buyerName", deserialize_with = "lenient_string")]
    pub buyer_name: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub hq: bool,
    #[serde(rename = "pricePerUnit", deserialize_with = "lenient_int")]
    pub price_per_unit: u64,
    #[serde(deserialize_with = "lenient_int")]
    pub quantity: u32,
    #[serde(deserialize_with = "lenient_int")]
    pub timestamp: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawUpload {
    /// Checked for presence and type by validation, hence untyped here.
    #[serde(rename = "worldID")]
    pub world_id: Value,
    #[serde(rename = "itemID")]
    pub item_id: Value,
    #[serde(rename = "uploaderID", deserialize_with = "lenient_string")]
    pub uploader_id: Option<String>,
    pub listings: Option<Vec<RawListing>>,
    pub entries: Option<Vec<RawHistoryEntry>>,
    #[serde(rename = "contentID", deserialize_with = "lenient_string")]
    pub content_id: Option<String>,
    #[serde(rename = "characterName", deserialize_with = "lenient_string")]
    pub character_name: Option<String>,
}

/// A hashed id seen next to a plaintext display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedIdentity {
    pub id: HashedId,
    pub kind: ContentKind,
    pub display_name: String,
}

fn reveal(id: &Option<String>, name: &Option<String>, kind: ContentKind) -> Option<RevealedIdentity> {
    let id = non_empty(id)?;
    let name = non_empty(name)?;
    Some(RevealedIdentity {
        id: hash(id),
        kind,
        display_name: name.to_string(),
    })
}

impl RawListing {
    fn normalize(self, revealed: &mut Vec<RevealedIdentity>) -> Listing {
        revealed.extend(reveal(&self.creator_id, &self.creator_name, ContentKind::Player));
        revealed.extend(reveal(&self.retainer_id, &self.retainer_name, ContentKind::Retainer));

        Listing {
            listing_id: hash_opt(self.listing_id.as_deref()),
            seller_id: hash_opt(self.seller_id.as_deref()),
            creator_id: non_empty(&self.creator_id).map(hash),
            creator_name: self.creator_name,
            retainer_id: hash_opt(self.retainer_id.as_deref()),
            retainer_name: self.retainer_name,
            retainer_city: self.retainer_city,
            hq: self.hq,
            on_mannequin: self.on_mannequin,
            materia: self.materia.unwrap_or_default(),
            price_per_unit: self.price_per_unit,
            quantity: self.quantity,
            total: line_total(self.price_per_unit, self.quantity),
            last_review_time: self.last_review_time,
            stain_id: self.stain_id,
            world_id: None,
        }
    }
}

impl RawHistoryEntry {
    fn normalize(self) -> HistoryEntry {
        HistoryEntry {
            seller_id: hash_opt(self.seller_id.as_deref()),
            buyer_name: self.buyer_name.unwrap_or_default(),
            hq: self.hq,
            price_per_unit: self.price_per_unit,
            quantity: self.quantity,
            total: line_total(self.price_per_unit, self.quantity),
            timestamp: self.timestamp,
            world_id: None,
        }
    }
}

impl RawUpload {
    /// Whether any section would produce a write.
    pub fn has_sections(&self) -> bool {
        self.listings.is_some()
            || self.entries.is_some()
            || (non_empty(&self.content_id).is_some() && non_empty(&self.character_name).is_some())
    }

    /// Hash every identity and fill in derived fields.
    pub fn normalize(self, uploader_id: HashedId, item_id: ItemId, world_id: WorldId) -> Upload {
        let mut revealed = Vec::new();
        let listings = self.listings.map(|listings| {
            listings
                .into_iter()
                .map(|listing| listing.normalize(&mut revealed))
                .collect()
        });
        let entries = self
            .entries
            .map(|entries| entries.into_iter().map(RawHistoryEntry::normalize).collect());
        let character = reveal(&self.content_id, &self.character_name, ContentKind::Player);

        Upload {
            uploader_id,
            item_id,
            world_id,
            listings,
            entries,
            character,
            revealed,
        }
    }
}

/// A validated, anonymized upload. Each section is written independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub uploader_id: HashedId,
    pub item_id: ItemId,
    pub world_id: WorldId,
    pub listings: Option<Vec<Listing>>,
    pub entries: Option<Vec<HistoryEntry>>,
    /// Top-level `contentID` + `characterName`.
    pub character: Option<RevealedIdentity>,
    /// Creator and retainer names revealed by listings.
    pub revealed: Vec<RevealedIdentity>,
}

impl Upload {
    /// Every identity this upload reveals, listings first.
    pub fn identities(&self) -> impl Iterator<Item = &RevealedIdentity> {
        self.revealed.iter().chain(self.character.iter())
    }
}
