//! Application context
//!
//! Owns every component built over one shared document store and exposes
//! the operations the outer surface serves. Cheap to share behind an `Arc`;
//! all methods take `&self`.

use std::sync::Arc;

use types::content::ContentIdentity;
use types::ids::{HashedId, ItemId};
use types::market::{ExtendedHistory, MarketSnapshot};
use types::stats::{DailyUploadStatistics, RecentlyUpdated};

use crate::blacklist::BlacklistRegistry;
use crate::config::CoreConfig;
use crate::content::ContentIdentityRegistry;
use crate::error::{QueryError, UploadError};
use crate::history::HistoryStore;
use crate::ingestion::{IngestionCoordinator, UploadReceipt};
use crate::query::{QueryResolver, Resolved};
use crate::reference::WorldTable;
use crate::snapshot::SnapshotStore;
use crate::sources::TrustedSourceRegistry;
use crate::stats::ActivityStatsRegistry;
use crate::store::{SharedStore, StoreResult};
use crate::validation::UploadValidator;

pub struct AppContext {
    worlds: Arc<WorldTable>,
    sources: TrustedSourceRegistry,
    blacklist: BlacklistRegistry,
    content: ContentIdentityRegistry,
    stats: ActivityStatsRegistry,
    ingestion: IngestionCoordinator,
    query: QueryResolver,
}

impl AppContext {
    pub fn new(store: SharedStore, worlds: WorldTable, config: CoreConfig) -> Self {
        let worlds = Arc::new(worlds);
        let sources = TrustedSourceRegistry::new(store.clone());
        let blacklist = BlacklistRegistry::new(store.clone());
        let content = ContentIdentityRegistry::new(store.clone());
        let stats = ActivityStatsRegistry::new(store.clone());
        let snapshots = SnapshotStore::new(store.clone(), worlds.clone());
        let history = HistoryStore::new(store, worlds.clone());

        let ingestion = IngestionCoordinator::new(
            sources.clone(),
            UploadValidator::new(blacklist.clone(), config.ingestion),
            content.clone(),
            snapshots.clone(),
            history.clone(),
            stats.clone(),
        );
        let query = QueryResolver::new(snapshots, history, worlds.clone(), config.query);

        Self {
            worlds,
            sources,
            blacklist,
            content,
            stats,
            ingestion,
            query,
        }
    }

    pub fn worlds(&self) -> &WorldTable {
        &self.worlds
    }

    /// Registry used to provision upload API keys.
    pub fn sources(&self) -> &TrustedSourceRegistry {
        &self.sources
    }

    /// Registry used to ban uploaders.
    pub fn blacklist(&self) -> &BlacklistRegistry {
        &self.blacklist
    }

    pub fn ingestion(&self) -> &IngestionCoordinator {
        &self.ingestion
    }

    pub async fn submit_upload(&self, api_key: &str, body: &[u8]) -> Result<UploadReceipt, UploadError> {
        self.ingestion.submit(api_key, body).await
    }

    pub async fn get_snapshot(
        &self,
        world: &str,
        item_ids: &[ItemId],
    ) -> Result<Resolved<MarketSnapshot>, QueryError> {
        self.query.get_snapshot(world, item_ids).await
    }

    pub async fn get_history(
        &self,
        world: &str,
        item_ids: &[ItemId],
        entries: Option<usize>,
    ) -> Result<Resolved<ExtendedHistory>, QueryError> {
        self.query.get_history(world, item_ids, entries).await
    }

    pub async fn get_content_identity(&self, id: &HashedId) -> StoreResult<Option<ContentIdentity>> {
        self.content.get(id).await
    }

    pub async fn get_daily_upload_stats(&self, days: Option<usize>) -> StoreResult<DailyUploadStatistics> {
        self.stats.get_daily_uploads(days).await
    }

    pub async fn get_recently_updated(&self, limit: Option<usize>) -> StoreResult<Vec<RecentlyUpdated>> {
        self.stats.get_recently_updated(limit).await
    }

    pub async fn get_least_recently_updated(
        &self,
        limit: Option<usize>,
    ) -> StoreResult<Vec<RecentlyUpdated>> {
        self.stats.get_least_recently_updated(limit).await
    }
}
