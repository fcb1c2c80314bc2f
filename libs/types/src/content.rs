//! Anonymized identity -> last known display name

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::HashedId;

/// What kind of in-game entity a content identity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Player,
    Retainer,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Player => f.write_str("player"),
            ContentKind::Retainer => f.write_str("retainer"),
        }
    }
}

/// Registry row. The `kind` is fixed by the first write for an id;
/// `display_name` follows the most recent write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdentity {
    #[serde(rename = "contentID")]
    pub id: HashedId,
    #[serde(rename = "contentType")]
    pub kind: ContentKind,
    #[serde(rename = "characterName")]
    pub display_name: String,
}
