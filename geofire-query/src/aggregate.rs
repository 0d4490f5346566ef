//! Concurrent fan-out over ring cells.
//!
//! ```text
//!            ┌──────────── JoinSet ─────────────┐
//!  cells ──► │ query_cell(c0)  ...  query_cell(cN) │
//!            └──────┬─────────────────────┬──────┘
//!                   │   mpsc<Business>    │
//!                   ▼                     ▼
//!            recv loop ◄── sleep_until(deadline)
//!                   │
//!                   ▼
//!               Deduper ──► Aggregation
//! ```
//!
//! The receive loop ends when every branch has dropped its sender or when the
//! deadline fires. On deadline the remaining branches are aborted and the
//! businesses received so far are returned.

use crate::dedup::Deduper;
use crate::executor::CellQueryExecutor;
use crate::geo::GeoPoint;
use crate::grid::CellId;
use crate::model::Business;
use crate::telemetry::QueryStats;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Result of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Unique businesses, in first-arrival order.
    pub businesses: Vec<Business>,
    /// Branch and record counts. `elapsed` is left for the caller to fill.
    pub stats: QueryStats,
}

/// Runs one [`CellQueryExecutor`] per cell and merges their output.
#[derive(Clone)]
pub struct FanOutAggregator {
    executor: CellQueryExecutor,
    channel_capacity: usize,
}

impl FanOutAggregator {
    pub fn new(executor: CellQueryExecutor, channel_capacity: usize) -> Self {
        Self {
            executor,
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Query every cell concurrently and collect the businesses.
    ///
    /// Returns once all branches have finished or `deadline` has passed,
    /// whichever comes first. Never fails: branch errors are counted in the
    /// stats and a late deadline yields a partial result.
    pub async fn aggregate(&self, origin: GeoPoint, cells: &[CellId], deadline: Instant) -> Aggregation {
        let mut stats = QueryStats {
            ring_cells: cells.len(),
            ..QueryStats::default()
        };

        let (tx, mut rx) = mpsc::channel::<Business>(self.channel_capacity);
        let mut branches = JoinSet::new();
        for &cell in cells {
            let executor = self.executor.clone();
            let tx = tx.clone();
            branches.spawn(async move { executor.query_cell(cell, origin, tx).await });
        }
        // Only branches hold senders now; the channel closes when the last one finishes.
        drop(tx);

        let mut dedup = Deduper::new();
        let timer = tokio::time::sleep_until(deadline);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(business) => {
                        stats.records_emitted += 1;
                        if business.distance.is_none() {
                            stats.records_without_distance += 1;
                        }
                        dedup.push(business);
                    }
                    None => break,
                },
                () = &mut timer => {
                    stats.deadline_exceeded = true;
                    warn!(
                        collected = dedup.len(),
                        pending = branches.len(),
                        "deadline elapsed before all cells finished; returning partial result"
                    );
                    break;
                }
            }
        }

        // Nothing sent after this point is consumed.
        drop(rx);
        if stats.deadline_exceeded {
            branches.abort_all();
        }

        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(report) => stats.record_branch(&report),
                Err(e) if e.is_cancelled() => stats.branches_abandoned += 1,
                Err(e) => {
                    warn!(error = %e, "cell branch panicked");
                    stats.branches_failed += 1;
                }
            }
        }

        stats.duplicates_removed = dedup.duplicates();
        let businesses = dedup.finish();
        stats.result_count = businesses.len();

        debug!(
            cells = stats.ring_cells,
            results = stats.result_count,
            duplicates = stats.duplicates_removed,
            "fan-out complete"
        );

        Aggregation { businesses, stats }
    }
}
