//! Per-query statistics and the sink they are reported to.

use crate::executor::{BranchOutcome, BranchReport};
use std::time::Duration;
use tracing::info;

/// Statistics for one nearby query.
///
/// Use these to see how much of a response came back and why the rest did
/// not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Cells in the neighbor ring.
    pub ring_cells: usize,

    /// Branches that read their cell to the end.
    pub branches_completed: usize,

    /// Branches stopped by a malformed record.
    pub branches_aborted: usize,

    /// Branches whose store query failed (or whose task panicked).
    pub branches_failed: usize,

    /// Branches still running when the deadline fired.
    pub branches_abandoned: usize,

    /// Businesses emitted by all branches, before dedup.
    pub records_emitted: usize,

    /// Records dropped because they did not decode.
    ///
    /// Summed from branch reports, so drops in a branch aborted at the
    /// deadline are not counted.
    pub records_dropped: usize,

    /// Received businesses without a distance, counted on arrival.
    pub records_without_distance: usize,

    /// Emitted businesses removed as duplicates.
    pub duplicates_removed: usize,

    /// Businesses in the response.
    pub result_count: usize,

    /// Whether the deadline fired before every branch finished.
    pub deadline_exceeded: bool,

    /// Wall-clock time of the whole query.
    pub elapsed: Duration,
}

impl QueryStats {
    /// Fold one branch report into the totals.
    pub fn record_branch(&mut self, report: &BranchReport) {
        match report.outcome {
            BranchOutcome::Exhausted => self.branches_completed += 1,
            BranchOutcome::AbortedOnMalformed => self.branches_aborted += 1,
            BranchOutcome::Failed(_) => self.branches_failed += 1,
            BranchOutcome::Cancelled => self.branches_abandoned += 1,
        }
        self.records_dropped += report.dropped;
    }

    /// Branches that produced a full or partial result without error.
    pub fn branches_succeeded(&self) -> usize {
        self.branches_completed + self.branches_aborted
    }
}

/// Receives statistics after every query. Accept-and-forget.
pub trait TelemetrySink: Send + Sync {
    fn record_query(&self, stats: &QueryStats);
}

/// Sink that logs a `tracing` event per query.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record_query(&self, stats: &QueryStats) {
        info!(
            elapsed_ms = stats.elapsed.as_millis() as u64,
            ring_cells = stats.ring_cells,
            results = stats.result_count,
            failed = stats.branches_failed,
            abandoned = stats.branches_abandoned,
            deadline_exceeded = stats.deadline_exceeded,
            "nearby query finished"
        );
    }
}
