use crate::error::AppError;
use crate::models::EntriesQuery;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use market_data::query::{Resolved, parse_item_ids};
use types::market::{ExtendedHistory, MarketSnapshot};

pub async fn get_market(
    State(state): State<AppState>,
    Path((world, items)): Path<(String, String)>,
) -> Result<Json<Resolved<MarketSnapshot>>, AppError> {
    let item_ids = parse_item_ids(&items)?;
    let snapshot = state.ctx.get_snapshot(&world, &item_ids).await?;
    Ok(Json(snapshot))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path((world, items)): Path<(String, String)>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Resolved<ExtendedHistory>>, AppError> {
    let item_ids = parse_item_ids(&items)?;
    let history = state
        .ctx
        .get_history(&world, &item_ids, query.entries)
        .await?;
    Ok(Json(history))
}
