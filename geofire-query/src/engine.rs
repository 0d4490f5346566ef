//! Nearby query entry point.

use crate::aggregate::FanOutAggregator;
use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::executor::CellQueryExecutor;
use crate::grid::{self, Resolution};
use crate::model::{FilterDistance, OrderBy, QueryRequest, QueryResponse};
use crate::store::BusinessStore;
use crate::telemetry::{QueryStats, TelemetrySink, TracingTelemetry};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, Instrument};

/// Response plus the statistics gathered while building it.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub response: QueryResponse,
    pub stats: QueryStats,
}

/// Answers "which businesses are near this point?".
///
/// Holds the injected store and configuration; each call is independent.
/// Cheap to clone.
#[derive(Clone)]
pub struct NearbyQueryEngine {
    store: Arc<dyn BusinessStore>,
    config: Arc<QueryConfig>,
    resolution: Resolution,
    fan_out: FanOutAggregator,
    telemetry: Arc<dyn TelemetrySink>,
}

impl NearbyQueryEngine {
    /// Create an engine, validating the configuration.
    pub fn new(store: Arc<dyn BusinessStore>, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        let resolution = config.resolution()?;
        let config = Arc::new(config);
        let executor = CellQueryExecutor::new(store.clone(), config.clone());
        let fan_out = FanOutAggregator::new(executor, config.channel_capacity);

        Ok(Self {
            store,
            config,
            resolution,
            fan_out,
            telemetry: Arc::new(TracingTelemetry),
        })
    }

    /// Replace the telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Run a query with the configured deadline.
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        self.execute_with_deadline(request, Instant::now() + self.config.deadline)
            .await
    }

    /// Run a query that must return by `deadline`.
    ///
    /// Fails only on an invalid origin or when the store cannot be reached.
    pub async fn execute_with_deadline(
        &self,
        request: &QueryRequest,
        deadline: Instant,
    ) -> Result<QueryOutcome> {
        let span = tracing::info_span!(
            "nearby_query",
            latitude = request.geo_point.latitude,
            longitude = request.geo_point.longitude,
        );
        self.run(request, deadline).instrument(span).await
    }

    async fn run(&self, request: &QueryRequest, deadline: Instant) -> Result<QueryOutcome> {
        let start = Instant::now();
        let origin = request.geo_point.validate()?;

        if request.filter_distance != FilterDistance::None || request.order_by != OrderBy::Default {
            debug!(
                filter_distance = ?request.filter_distance,
                order_by = ?request.order_by,
                "filter/order preferences accepted but not applied"
            );
        }

        self.store
            .check_connection()
            .await
            .map_err(QueryError::Upstream)?;

        let center = grid::cell_of(origin, self.resolution)?;
        let cells = grid::ring(center, self.config.ring_radius);
        debug!(center = %center, cells = cells.len(), "expanded neighbor ring");

        let aggregation = self.fan_out.aggregate(origin, &cells, deadline).await;

        let mut stats = aggregation.stats;
        stats.elapsed = start.elapsed();
        self.telemetry.record_query(&stats);

        Ok(QueryOutcome {
            response: QueryResponse {
                businesses: aggregation.businesses,
            },
            stats,
        })
    }
}
