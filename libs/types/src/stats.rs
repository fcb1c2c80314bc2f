//! Upload activity rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, WorldId};

/// Number of accepted uploads on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUploadCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Upload counts, most recent day first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUploadStatistics {
    #[serde(rename = "uploadCountByDay")]
    pub days: Vec<DailyUploadCount>,
}

/// When an (item, world) pair last received data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyUpdated {
    #[serde(rename = "worldID")]
    pub world_id: WorldId,
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    /// Unix milliseconds.
    pub last_upload_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_count_serializes_iso_date() {
        let row = DailyUploadCount {
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            count: 3,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["date"], "2026-10-18");
        assert_eq!(value["count"], 3);
    }
}
