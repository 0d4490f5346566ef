//! GeoFire HTTP server
//!
//! A thin HTTP wrapper around `geofire-query`: one query endpoint that takes
//! a coordinate and returns the businesses in the surrounding H3 ring.
//!
//! # Endpoints
//!
//! - `POST /v1/businesses/nearby`: nearby query
//! - `GET /v1/stats`: query counters since start
//! - `GET /health`: liveness
//!
//! # Example
//!
//! ```ignore
//! use geofire_server::{GeoFireServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let server = GeoFireServer::new(config).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod config;
pub mod config_file;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod token_verify;

pub use config::{AuthMode, ServerConfig};
pub use error::{Result, ServerError, StartupError};
pub use metrics::{MetricsSnapshot, QueryMetrics};
pub use state::AppState;
pub use telemetry::{init_logging, TelemetryConfig};

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// GeoFire HTTP Server
pub struct GeoFireServer {
    /// Application state
    state: Arc<AppState>,
    /// Configured router
    router: Router,
}

impl GeoFireServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> std::result::Result<Self, StartupError> {
        let telemetry_config = TelemetryConfig::with_server_config(&config);
        let state = Arc::new(AppState::new(config, telemetry_config)?);
        let router = routes::build_router(state.clone());

        Ok(Self { state, router })
    }

    /// Get a reference to the application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the router for testing
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl-C
    pub async fn run(self) -> std::result::Result<(), StartupError> {
        let addr = self.state.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;

        info!(
            addr = %addr,
            auth_mode = ?self.state.config.auth_mode,
            resolution = self.state.config.resolution,
            ring_radius = self.state.config.ring_radius,
            "GeoFire server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
