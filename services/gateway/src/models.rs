use serde::Deserialize;

/// `?entries=N` on history and recency reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntriesQuery {
    pub entries: Option<usize>,
}

/// `?days=N` on the upload-history read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<usize>,
}
