//! Upload activity statistics
//!
//! Two documents in `extraData`:
//! - `uploadCountByDay`: one integer field per UTC calendar date
//! - `recentlyUpdated`: one timestamp field per `world:item` pair
//!
//! Both recency views (most and least recently updated) are read from the
//! same index, so an external refresh scheduler can pick what to fetch
//! next from either end.
//!
//! The index is one document holding every pair ever marked, so each
//! upload that touches market data writes the same key and each recency
//! read loads and sorts the whole index. Its size is bounded by worlds
//! times marketable items (tens of thousands of pairs per world), not by
//! upload volume; only the returned rows are capped.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;
use types::ids::{ItemId, WorldId};
use types::stats::{DailyUploadCount, DailyUploadStatistics, RecentlyUpdated};

use crate::store::{Collection, Fields, SharedStore, StoreResult};

const DAILY_UPLOADS_KEY: &str = "uploadCountByDay";
const RECENTLY_UPDATED_KEY: &str = "recentlyUpdated";

/// Rows returned by a recency view when the caller gives no limit.
pub const DEFAULT_RECENCY_LIMIT: usize = 50;
/// Upper bound on rows returned by a recency view.
pub const MAX_RECENCY_LIMIT: usize = 200;

#[derive(Clone)]
pub struct ActivityStatsRegistry {
    store: SharedStore,
}

impl ActivityStatsRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Count one upload against today's (UTC) bucket. Returns the new count.
    pub async fn increment_daily_uploads(&self) -> StoreResult<u64> {
        self.increment_daily_uploads_on(chrono::Utc::now().date_naive())
            .await
    }

    pub async fn increment_daily_uploads_on(&self, date: NaiveDate) -> StoreResult<u64> {
        let count = self
            .store
            .increment(Collection::ExtraData, DAILY_UPLOADS_KEY, &date.to_string(), 1)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// The most recent `days` buckets (all when `None`), newest first.
    pub async fn get_daily_uploads(&self, days: Option<usize>) -> StoreResult<DailyUploadStatistics> {
        let Some(doc) = self
            .store
            .find_one(Collection::ExtraData, DAILY_UPLOADS_KEY)
            .await?
        else {
            return Ok(DailyUploadStatistics::default());
        };

        let mut rows: Vec<DailyUploadCount> = fields_of(&doc)
            .filter_map(|(field, value)| {
                let date = field.parse::<NaiveDate>().ok();
                let count = value.as_u64();
                match (date, count) {
                    (Some(date), Some(count)) => Some(DailyUploadCount { date, count }),
                    _ => {
                        warn!(field, "Skipping malformed daily upload bucket");
                        None
                    }
                }
            })
            .collect();

        rows.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(days) = days {
            rows.truncate(days);
        }
        Ok(DailyUploadStatistics { days: rows })
    }

    /// Stamp `(world_id, item_id)` as updated now.
    pub async fn mark_item_updated(&self, world_id: WorldId, item_id: ItemId) -> StoreResult<()> {
        self.mark_item_updated_at(world_id, item_id, crate::now_millis())
            .await
    }

    pub async fn mark_item_updated_at(
        &self,
        world_id: WorldId,
        item_id: ItemId,
        timestamp: i64,
    ) -> StoreResult<()> {
        let mut set = Fields::new();
        set.insert(format!("{}:{}", world_id, item_id), Value::from(timestamp));
        self.store
            .set_fields(Collection::ExtraData, RECENTLY_UPDATED_KEY, set, Fields::new())
            .await
    }

    /// Most recently updated pairs first.
    pub async fn get_recently_updated(&self, limit: Option<usize>) -> StoreResult<Vec<RecentlyUpdated>> {
        let mut rows = self.recency_rows().await?;
        rows.sort_by(|a, b| {
            b.last_upload_time
                .cmp(&a.last_upload_time)
                .then_with(|| (a.world_id, a.item_id).cmp(&(b.world_id, b.item_id)))
        });
        rows.truncate(clamp_limit(limit));
        Ok(rows)
    }

    /// Least recently updated pairs first.
    pub async fn get_least_recently_updated(
        &self,
        limit: Option<usize>,
    ) -> StoreResult<Vec<RecentlyUpdated>> {
        let mut rows = self.recency_rows().await?;
        rows.sort_by(|a, b| {
            a.last_upload_time
                .cmp(&b.last_upload_time)
                .then_with(|| (a.world_id, a.item_id).cmp(&(b.world_id, b.item_id)))
        });
        rows.truncate(clamp_limit(limit));
        Ok(rows)
    }

    async fn recency_rows(&self) -> StoreResult<Vec<RecentlyUpdated>> {
        let Some(doc) = self
            .store
            .find_one(Collection::ExtraData, RECENTLY_UPDATED_KEY)
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(fields_of(&doc)
            .filter_map(|(field, value)| {
                let row = parse_pair(field).zip(value.as_i64()).map(
                    |((world_id, item_id), last_upload_time)| RecentlyUpdated {
                        world_id,
                        item_id,
                        last_upload_time,
                    },
                );
                if row.is_none() {
                    warn!(field, "Skipping malformed recency entry");
                }
                row
            })
            .collect())
    }
}

fn fields_of<'a>(doc: &'a Value) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
    doc.as_object()
        .into_iter()
        .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
}

fn parse_pair(field: &str) -> Option<(WorldId, ItemId)> {
    let (world, item) = field.split_once(':')?;
    Some((world.parse().ok()?, item.parse().ok()?))
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_RECENCY_LIMIT).min(MAX_RECENCY_LIMIT)
}
