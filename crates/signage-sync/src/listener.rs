//! The branch's HTTP surface.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use signage_types::{endpoints, BranchStatus, HealthResponse, MessageResponse};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::SyncTrigger;
use crate::cache::LocalCache;

/// Shared state for branch handlers.
#[derive(Clone, Debug)]
pub struct BranchState {
    pub trigger: SyncTrigger,
    pub cache: Arc<LocalCache>,
}

/// `GET /reload`: schedule a sync and answer at once.
pub async fn reload_handler(State(state): State<BranchState>) -> Json<MessageResponse> {
    info!("reload signal received");
    state.trigger.trigger();
    Json(MessageResponse::new("Reload signal received"))
}

pub async fn status_handler(State(state): State<BranchState>) -> Json<BranchStatus> {
    Json(state.cache.status())
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub fn build_branch_router(state: BranchState) -> Router {
    Router::new()
        .route(endpoints::RELOAD, get(reload_handler))
        .route(endpoints::STATUS, get(status_handler))
        .route(endpoints::HEALTH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
