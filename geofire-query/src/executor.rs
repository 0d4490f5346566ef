//! Per-cell retrieval.
//!
//! One [`CellQueryExecutor::query_cell`] call issues a single bounded query
//! for one coarse cell, decodes each record, annotates it with its distance
//! from the origin, and pushes it to the aggregator as soon as it is ready.
//!
//! Failures never leave the branch: a store error ends it early, a malformed
//! record is dropped (and ends it under [`MalformedRecordPolicy::AbortBranch`]),
//! and an unresolvable location only costs the record its distance.

use crate::config::{MalformedRecordPolicy, QueryConfig};
use crate::geo::{haversine, GeoPoint};
use crate::grid::{self, CellId};
use crate::model::Business;
use crate::store::{BusinessStore, CellField, CellQuery, DecodedRecord};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn, Instrument};

/// How a cell branch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// All records were read.
    Exhausted,
    /// Stopped at a malformed record.
    AbortedOnMalformed,
    /// The store query or stream failed.
    Failed(String),
    /// The aggregator stopped listening (deadline).
    Cancelled,
}

/// What one cell branch did.
#[derive(Debug, Clone)]
pub struct BranchReport {
    pub cell: CellId,
    pub outcome: BranchOutcome,
    /// Businesses handed to the aggregator.
    pub emitted: usize,
    /// Records dropped because they did not decode.
    pub dropped: usize,
    /// Emitted businesses without a distance.
    pub without_distance: usize,
}

impl BranchReport {
    fn new(cell: CellId) -> Self {
        Self {
            cell,
            outcome: BranchOutcome::Exhausted,
            emitted: 0,
            dropped: 0,
            without_distance: 0,
        }
    }
}

/// Runs the retrieval for one cell. Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct CellQueryExecutor {
    store: Arc<dyn BusinessStore>,
    config: Arc<QueryConfig>,
}

impl CellQueryExecutor {
    pub fn new(store: Arc<dyn BusinessStore>, config: Arc<QueryConfig>) -> Self {
        Self { store, config }
    }

    /// Query one cell, sending each business to `sink` as it is ready.
    pub async fn query_cell(
        &self,
        cell: CellId,
        origin: GeoPoint,
        sink: mpsc::Sender<Business>,
    ) -> BranchReport {
        let span = tracing::debug_span!("cell_query", cell = %cell);
        self.run(cell, origin, sink).instrument(span).await
    }

    async fn run(&self, cell: CellId, origin: GeoPoint, sink: mpsc::Sender<Business>) -> BranchReport {
        let mut report = BranchReport::new(cell);

        let query = CellQuery {
            collection: self.config.collection.clone(),
            field: self.config.coarse_field.clone(),
            value: cell.to_string(),
            limit: self.config.cell_limit,
        };

        let mut records = match self.store.query(query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "cell query failed");
                report.outcome = BranchOutcome::Failed(e.to_string());
                return report;
            }
        };

        while let Some(next) = records.next().await {
            let record = match next {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "cell query stream failed");
                    report.outcome = BranchOutcome::Failed(e.to_string());
                    return report;
                }
            };

            let decoded = match record.decode(&self.config.coarse_field, &self.config.fine_field) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(record_id = %record.id, error = %e, "dropping malformed business record");
                    report.dropped += 1;
                    match self.config.malformed_policy {
                        MalformedRecordPolicy::Skip => continue,
                        MalformedRecordPolicy::AbortBranch => {
                            report.outcome = BranchOutcome::AbortedOnMalformed;
                            return report;
                        }
                    }
                }
            };

            let business = annotate(decoded, &origin, &self.config.fine_field);
            let has_distance = business.distance.is_some();

            if sink.send(business).await.is_err() {
                debug!("aggregator gone, abandoning cell");
                report.outcome = BranchOutcome::Cancelled;
                return report;
            }
            report.emitted += 1;
            if !has_distance {
                report.without_distance += 1;
            }
        }

        debug!(emitted = report.emitted, dropped = report.dropped, "cell exhausted");
        report
    }
}

/// Attach the distance from `origin` when the fine location is usable.
pub fn annotate(decoded: DecodedRecord, origin: &GeoPoint, fine_field: &str) -> Business {
    let DecodedRecord {
        mut business,
        location,
    } = decoded;

    match location {
        CellField::Present(fine) => {
            let location = grid::to_point(fine);
            business.distance = Some(haversine(&location, origin));
        }
        CellField::Absent => {
            debug!(record_id = %business.id, field = fine_field, "no stored location");
        }
        CellField::Malformed(raw) => {
            warn!(record_id = %business.id, field = fine_field, value = %raw, "unparseable stored location");
        }
    }

    business
}
