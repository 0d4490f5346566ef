//! Process-wide query counters exposed at `/v1/stats`

use geofire_query::{QueryStats, TelemetrySink, TracingTelemetry};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters fed by every query the engine runs.
///
/// Also forwards each query to [`TracingTelemetry`] so the per-query log
/// line is kept.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    queries: AtomicU64,
    results: AtomicU64,
    partial_results: AtomicU64,
    branches_failed: AtomicU64,
    branches_abandoned: AtomicU64,
    branches_aborted: AtomicU64,
    records_dropped: AtomicU64,
    records_without_distance: AtomicU64,
    duplicates_removed: AtomicU64,
    elapsed_ms_total: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of [`QueryMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub results: u64,
    /// Queries cut short by the deadline
    pub partial_results: u64,
    pub branches_failed: u64,
    pub branches_abandoned: u64,
    pub branches_aborted: u64,
    pub records_dropped: u64,
    pub records_without_distance: u64,
    pub duplicates_removed: u64,
    pub elapsed_ms_total: u64,
    /// Requests rejected before reaching the engine or failed by it
    pub rejected: u64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request that ended in an error response
    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            queries: load(&self.queries),
            results: load(&self.results),
            partial_results: load(&self.partial_results),
            branches_failed: load(&self.branches_failed),
            branches_abandoned: load(&self.branches_abandoned),
            branches_aborted: load(&self.branches_aborted),
            records_dropped: load(&self.records_dropped),
            records_without_distance: load(&self.records_without_distance),
            duplicates_removed: load(&self.duplicates_removed),
            elapsed_ms_total: load(&self.elapsed_ms_total),
            rejected: load(&self.rejected),
        }
    }
}

impl TelemetrySink for QueryMetrics {
    fn record_query(&self, stats: &QueryStats) {
        let add = |counter: &AtomicU64, n: usize| {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        };

        add(&self.queries, 1);
        add(&self.results, stats.result_count);
        add(&self.partial_results, usize::from(stats.deadline_exceeded));
        add(&self.branches_failed, stats.branches_failed);
        add(&self.branches_abandoned, stats.branches_abandoned);
        add(&self.branches_aborted, stats.branches_aborted);
        add(&self.records_dropped, stats.records_dropped);
        add(&self.records_without_distance, stats.records_without_distance);
        add(&self.duplicates_removed, stats.duplicates_removed);
        self.elapsed_ms_total.fetch_add(
            u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );

        TracingTelemetry.record_query(stats);
    }
}
