//! Upload validation
//!
//! Two phases. The pre-cast phase looks only at the API key and the raw
//! body. The post-cast phase runs once the body has been read as an
//! upload and the uploader digest is known. Any failure here happens
//! before the upload touches the snapshot, history or content stores.

use serde_json::Value;
use tracing::warn;
use types::errors::ValidationError;
use types::ids::{HashedId, ItemId, WorldId};

use crate::blacklist::BlacklistRegistry;
use crate::config::IngestionConfig;
use crate::error::UploadError;
use crate::upload::RawUpload;

/// Pre-cast: non-empty key, body present and valid JSON.
pub fn precheck(api_key: &str, body: &[u8]) -> Result<Value, UploadError> {
    if api_key.trim().is_empty() {
        return Err(UploadError::Authentication("missing API key".to_string()));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(UploadError::UnsupportedMedia("empty body".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| UploadError::UnsupportedMedia(e.to_string()))
}

/// Read a JSON document as an upload.
pub fn cast(document: Value) -> Result<RawUpload, ValidationError> {
    if !document.is_object() {
        return Err(ValidationError::Malformed {
            reason: "upload must be a JSON object".to_string(),
        });
    }
    serde_json::from_value(document).map_err(|e| ValidationError::Malformed {
        reason: e.to_string(),
    })
}

/// A positive integer id that fits in 32 bits.
fn numeric_id(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .filter(|id| *id > 0)
        .and_then(|id| u32::try_from(id).ok())
}

#[derive(Clone)]
pub struct UploadValidator {
    blacklist: BlacklistRegistry,
    config: IngestionConfig,
}

impl UploadValidator {
    pub fn new(blacklist: BlacklistRegistry, config: IngestionConfig) -> Self {
        Self { blacklist, config }
    }

    /// Post-cast: ids present and numeric, world accepted, uploader not
    /// banned, at least one section to write.
    pub async fn post_cast(
        &self,
        uploader_id: &HashedId,
        upload: &RawUpload,
    ) -> Result<(ItemId, WorldId), UploadError> {
        let world_id = numeric_id(&upload.world_id).ok_or(ValidationError::MissingWorldId)?;
        let item_id = numeric_id(&upload.item_id).ok_or(ValidationError::MissingItemId)?;

        let world_id = WorldId::new(world_id);
        if !self.config.accepted_worlds.contains(&world_id.get()) {
            return Err(ValidationError::WorldOutOfRange { world_id }.into());
        }

        if self.blacklist.is_banned(uploader_id).await? {
            warn!(%uploader_id, "Rejected upload from blacklisted uploader");
            return Err(ValidationError::Blacklisted.into());
        }

        if !upload.has_sections() {
            return Err(ValidationError::NothingToProcess.into());
        }

        Ok((ItemId::new(item_id), world_id))
    }
}
