//! Upload ingestion
//!
//! Runs one upload end to end:
//!
//! ```text
//! precheck ─► authenticate ─► { source usage, daily count }
//!                                      │
//!         uploader digest ◄────────────┘
//!                │
//!           post-cast validation (ids, world range, blacklist, sections)
//!                │
//!           normalize (hash ids, totals, defaults)
//!                │
//!   ┌────────────┼──────────────┬──────────────┐
//! snapshot    history      content ids      recency
//! replace     append         set           mark
//!   └────────────┴──────┬───────┴──────────────┘
//!                      join
//! ```
//!
//! Sub-writes inside each fan-out run concurrently and are always joined,
//! never cancelled. There is no rollback: if one sub-write fails the
//! others that already committed stay, and the caller receives a single
//! store failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::content::ContentIdentityRegistry;
use crate::error::UploadError;
use crate::hashing::hash_opt;
use crate::history::HistoryStore;
use crate::snapshot::SnapshotStore;
use crate::sources::TrustedSourceRegistry;
use crate::stats::ActivityStatsRegistry;
use crate::store::StoreResult;
use crate::upload::{RevealedIdentity, Upload};
use crate::validation::{self, UploadValidator};

/// What an accepted upload wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: Uuid,
    pub source_name: String,
    /// Listings written, if the upload carried a listing section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listings: Option<usize>,
    /// History entries appended, if the upload carried a history section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    /// Distinct content identities written.
    pub identities: usize,
}

pub struct IngestionCoordinator {
    sources: TrustedSourceRegistry,
    validator: UploadValidator,
    content: ContentIdentityRegistry,
    snapshots: SnapshotStore,
    history: HistoryStore,
    stats: ActivityStatsRegistry,
    uploads_accepted: AtomicU64,
    uploads_rejected: AtomicU64,
}

impl IngestionCoordinator {
    pub fn new(
        sources: TrustedSourceRegistry,
        validator: UploadValidator,
        content: ContentIdentityRegistry,
        snapshots: SnapshotStore,
        history: HistoryStore,
        stats: ActivityStatsRegistry,
    ) -> Self {
        Self {
            sources,
            validator,
            content,
            snapshots,
            history,
            stats,
            uploads_accepted: AtomicU64::new(0),
            uploads_rejected: AtomicU64::new(0),
        }
    }

    /// Validate, anonymize and store one upload.
    pub async fn submit(&self, api_key: &str, body: &[u8]) -> Result<UploadReceipt, UploadError> {
        let upload_id = Uuid::now_v7();
        let result = self.process(upload_id, api_key, body).await;

        match &result {
            Ok(receipt) => {
                self.uploads_accepted.fetch_add(1, Ordering::Relaxed);
                info!(
                    %upload_id,
                    source = %receipt.source_name,
                    listings = ?receipt.listings,
                    entries = ?receipt.entries,
                    identities = receipt.identities,
                    "Upload accepted"
                );
            }
            Err(UploadError::Store(e)) => {
                self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
                error!(%upload_id, error = %e, "Upload failed in store");
            }
            Err(e) => {
                self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
                warn!(%upload_id, error = %e, "Upload rejected");
            }
        }
        result
    }

    /// Uploads accepted since creation.
    pub fn uploads_accepted(&self) -> u64 {
        self.uploads_accepted.load(Ordering::Relaxed)
    }

    /// Uploads rejected or failed since creation.
    pub fn uploads_rejected(&self) -> u64 {
        self.uploads_rejected.load(Ordering::Relaxed)
    }

    async fn process(
        &self,
        upload_id: Uuid,
        api_key: &str,
        body: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        let document = validation::precheck(api_key, body)?;

        let source = self
            .sources
            .authenticate(api_key)
            .await?
            .ok_or_else(|| UploadError::Authentication("unknown API key".to_string()))?;
        debug!(%upload_id, source = %source.source_name, "Received upload");

        let (usage, daily) = tokio::join!(
            self.sources.record_usage(api_key),
            self.stats.increment_daily_uploads(),
        );
        settle(
            upload_id,
            [
                ("source usage", usage.map(drop)),
                ("daily uploads", daily.map(drop)),
            ],
        )?;

        let raw = validation::cast(document)?;
        let uploader_id = hash_opt(raw.uploader_id.as_deref());
        let (item_id, world_id) = self.validator.post_cast(&uploader_id, &raw).await?;
        let upload = raw.normalize(uploader_id, item_id, world_id);

        let listings = upload.listings.as_ref().map(Vec::len);
        let entries = upload.entries.as_ref().map(Vec::len);
        let identities = self.dispatch(upload_id, upload).await?;

        Ok(UploadReceipt {
            upload_id,
            source_name: source.source_name,
            listings,
            entries,
            identities,
        })
    }

    /// Fan out one write per present section and join them all.
    /// Returns the number of content identities written.
    async fn dispatch(&self, upload_id: Uuid, upload: Upload) -> StoreResult<usize> {
        let identities: Vec<RevealedIdentity> =
            distinct_identities(&upload).into_iter().cloned().collect();
        let identity_count = identities.len();

        let Upload {
            uploader_id,
            item_id,
            world_id,
            listings,
            entries,
            ..
        } = upload;
        let market_touched = listings.is_some() || entries.is_some();

        let snapshot_write = async {
            match listings {
                Some(listings) => {
                    self.snapshots
                        .replace(&uploader_id, item_id, world_id, listings)
                        .await
                }
                None => Ok(()),
            }
        };
        let history_write = async {
            match entries {
                Some(entries) => {
                    self.history
                        .append(&uploader_id, item_id, world_id, entries)
                        .await
                }
                None => Ok(()),
            }
        };
        let identity_writes = join_all(
            identities
                .iter()
                .map(|identity| self.content.set(&identity.id, identity.kind, &identity.display_name)),
        );
        let recency_write = async {
            if market_touched {
                self.stats.mark_item_updated(world_id, item_id).await
            } else {
                Ok(())
            }
        };

        let (snapshot, history, identity_results, recency) =
            tokio::join!(snapshot_write, history_write, identity_writes, recency_write);
        let identity_outcome = identity_results
            .into_iter()
            .collect::<StoreResult<Vec<()>>>()
            .map(drop);

        settle(
            upload_id,
            [
                ("snapshot", snapshot),
                ("history", history),
                ("content identities", identity_outcome),
                ("recency index", recency),
            ],
        )?;
        Ok(identity_count)
    }
}

/// One write per revealed id; the last name seen in the upload wins.
fn distinct_identities(upload: &Upload) -> Vec<&RevealedIdentity> {
    let mut latest: HashMap<&str, &RevealedIdentity> = HashMap::new();
    for identity in upload.identities() {
        latest.insert(identity.id.as_str(), identity);
    }
    latest.into_values().collect()
}

/// Log every failed sub-write and surface the first one.
fn settle<const N: usize>(upload_id: Uuid, results: [(&str, StoreResult<()>); N]) -> StoreResult<()> {
    let mut first = None;
    for (write, result) in results {
        if let Err(e) = result {
            error!(%upload_id, write, error = %e, "Sub-write failed");
            first.get_or_insert(e);
        }
    }
    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
