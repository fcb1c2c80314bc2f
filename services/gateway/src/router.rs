use crate::handlers::{extra, market, upload};
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState, upload_limit_bytes: usize) -> Router {
    let upload_routes = Router::new()
        .route("/upload/{api_key}", post(upload::submit_upload))
        .layer(DefaultBodyLimit::max(upload_limit_bytes));

    let api_routes = Router::new()
        .route("/{world}/{items}", get(market::get_market))
        .route("/history/{world}/{items}", get(market::get_history))
        .route("/extra/content/{id}", get(extra::get_content))
        .route("/extra/stats/upload-history", get(extra::get_upload_history))
        .route("/extra/stats/recently-updated", get(extra::get_recently_updated))
        .route(
            "/extra/stats/least-recently-updated",
            get(extra::get_least_recently_updated),
        );

    Router::new()
        .merge(upload_routes)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
