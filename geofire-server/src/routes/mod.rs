//! HTTP route handlers and router configuration

mod admin;
mod nearby;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Header carrying the engine's wall-clock time for a nearby query
pub const ELAPSED_HEADER: &str = "x-query-elapsed-ms";

/// Build the main application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(admin::health))
        .route("/v1/stats", get(admin::stats))
        .route("/v1/businesses/nearby", post(nearby::nearby))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}
