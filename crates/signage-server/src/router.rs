use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use signage_types::endpoints;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all distribution endpoints.
pub fn build_router(service: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route(endpoints::UPLOAD, post(handler::upload_handler))
        .route(endpoints::SLIDES, get(handler::list_handler))
        .route(endpoints::SLIDE, get(handler::fetch_handler))
        .route(endpoints::RELOAD, get(handler::reload_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
