//! Error types surfaced by the core operations

use thiserror::Error;
use types::errors::ValidationError;

use crate::store::StoreError;

/// Why an upload was not accepted.
///
/// Callers only learn that an upload failed and which class of failure
/// it was; a `Store` failure does not say which sub-write broke, and
/// sub-writes that already committed stay committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),

    #[error("invalid world id: {0:?}")]
    InvalidWorld(String),

    #[error("no item ids requested")]
    NoItems,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
