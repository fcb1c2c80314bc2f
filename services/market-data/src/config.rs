//! Tunables for the ingestion and query paths

use std::ops::RangeInclusive;

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// World ids uploads may target. Worlds outside this range cannot be
    /// observed by upload agents, so data claiming to come from them is rejected.
    pub accepted_worlds: RangeInclusive<u32>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            accepted_worlds: 17..=99,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Hard cap on history entries returned per item.
    pub max_history_entries: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_history_entries: 500,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub ingestion: IngestionConfig,
    pub query: QueryConfig,
}
