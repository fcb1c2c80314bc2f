//! Validation error taxonomy for uploads
//!
//! Every variant is raised before any listing, history or identity of
//! the offending upload is written.

use thiserror::Error;

use crate::ids::WorldId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing or non-numeric worldID")]
    MissingWorldId,

    #[error("missing or non-numeric itemID")]
    MissingItemId,

    #[error("world {world_id} does not accept uploads")]
    WorldOutOfRange { world_id: WorldId },

    #[error("uploader is blacklisted")]
    Blacklisted,

    #[error("upload contains nothing to process")]
    NothingToProcess,

    #[error("malformed upload: {reason}")]
    Malformed { reason: String },
}
