//! Admin endpoints: /health, /v1/stats

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    tracing::debug!("health check requested");
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Server statistics response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Coarse grid resolution queried
    pub resolution: u8,
    /// Ring radius around the origin cell
    pub ring_radius: u32,
    /// Query counters since start
    pub queries: MetricsSnapshot,
    /// Server version
    pub version: &'static str,
}

/// Server statistics endpoint
///
/// GET /v1/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    tracing::debug!("server stats requested");

    let config = state.engine.config();
    Json(StatsResponse {
        uptime_secs: state.uptime_secs(),
        resolution: config.coarse_resolution,
        ring_radius: config.ring_radius,
        queries: state.metrics.snapshot(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
