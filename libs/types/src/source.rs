//! Upload agents and banned uploaders

use serde::{Deserialize, Serialize};

use crate::ids::HashedId;

/// An upload agent holding a provisioned API key.
///
/// Only the digest of the key is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedSource {
    pub api_key_hash: HashedId,
    pub source_name: String,
    #[serde(default)]
    pub upload_count: u64,
}

/// A banned uploader. Uploads from this digest are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    #[serde(rename = "uploaderID")]
    pub uploader_id: HashedId,
}
