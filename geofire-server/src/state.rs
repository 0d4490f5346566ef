//! Application state shared across handlers

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::metrics::QueryMetrics;
use crate::telemetry::TelemetryConfig;
use geofire_query::{BusinessStore, MemoryStore, NearbyQueryEngine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Application state shared across all request handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Telemetry configuration
    pub telemetry_config: TelemetryConfig,
    /// Nearby query engine over the configured store
    pub engine: NearbyQueryEngine,
    /// Counters reported at `/v1/stats`
    pub metrics: Arc<QueryMetrics>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state backed by an in-memory store, seeded from
    /// `config.data_file` when one is set
    pub fn new(
        config: ServerConfig,
        telemetry_config: TelemetryConfig,
    ) -> Result<Self, StartupError> {
        let store = match &config.data_file {
            Some(path) => {
                let store = MemoryStore::from_json_file(path)?;
                info!(path = %path.display(), records = store.len(), "loaded business data");
                store
            }
            None => {
                warn!("no data file configured; serving from an empty store");
                MemoryStore::new()
            }
        };

        Self::with_store(config, telemetry_config, Arc::new(store))
    }

    /// Create state over an existing store
    pub fn with_store(
        config: ServerConfig,
        telemetry_config: TelemetryConfig,
        store: Arc<dyn BusinessStore>,
    ) -> Result<Self, StartupError> {
        config.validate().map_err(StartupError::Config)?;

        let metrics = Arc::new(QueryMetrics::new());
        let engine =
            NearbyQueryEngine::new(store, config.query_config())?.with_telemetry(metrics.clone());

        Ok(Self {
            config,
            telemetry_config,
            engine,
            metrics,
            start_time: Instant::now(),
        })
    }

    /// Get server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
