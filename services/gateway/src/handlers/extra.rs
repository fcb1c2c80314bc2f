use crate::error::AppError;
use crate::models::{DaysQuery, EntriesQuery};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use types::ids::HashedId;
use types::stats::{DailyUploadStatistics, RecentlyUpdated};

/// Unknown ids answer with an empty object rather than 404.
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let identity = state
        .ctx
        .get_content_identity(&HashedId::from_digest(id))
        .await?;

    let body = match identity {
        Some(identity) => serde_json::to_value(identity).map_err(anyhow::Error::from)?,
        None => json!({}),
    };
    Ok(Json(body))
}

pub async fn get_upload_history(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<DailyUploadStatistics>, AppError> {
    Ok(Json(state.ctx.get_daily_upload_stats(query.days).await?))
}

pub async fn get_recently_updated(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<RecentlyUpdated>>, AppError> {
    Ok(Json(state.ctx.get_recently_updated(query.entries).await?))
}

pub async fn get_least_recently_updated(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<RecentlyUpdated>>, AppError> {
    Ok(Json(state.ctx.get_least_recently_updated(query.entries).await?))
}
