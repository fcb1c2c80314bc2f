//! Identifier types for market board entities
//!
//! Worlds and items are addressed by the game's numeric ids. Every
//! identifier that names a person or a listing is only ever held as a
//! one-way digest (`HashedId`); raw identifiers never reach a store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric id of a game world (server)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(u32);

impl WorldId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorldId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Numeric id of a tradeable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u32);

impl ItemId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Hex digest standing in for an uploader, character, retainer or listing id.
///
/// Only the hasher in the core constructs these from raw input; the
/// string form is what gets persisted and returned to readers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedId(String);

impl HashedId {
    /// Wrap an already computed digest.
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of the single snapshot / history document for an (item, world) pair.
pub fn market_key(item_id: ItemId, world_id: WorldId) -> String {
    format!("{}:{}", item_id, world_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_id_parse() {
        assert_eq!("74".parse::<WorldId>().unwrap(), WorldId::new(74));
        assert_eq!(" 74 ".parse::<WorldId>().unwrap(), WorldId::new(74));
        assert!("Coeurl".parse::<WorldId>().is_err());
    }

    #[test]
    fn test_item_id_serialization() {
        let id = ItemId::new(5333);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "5333");

        let deserialized: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_hashed_id_is_transparent() {
        let id = HashedId::from_digest("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_market_key_is_unique_per_pair() {
        let a = market_key(ItemId::new(5333), WorldId::new(74));
        let b = market_key(ItemId::new(74), WorldId::new(5333));
        assert_eq!(a, "5333:74");
        assert_ne!(a, b);
    }
}
