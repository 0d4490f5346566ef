//! Deduplication across ring cells.
//!
//! A business is stored under a single coarse cell, so a ring normally yields
//! each one once. Duplicates can still appear when the store returns the same
//! document for two cells (re-tagged records, replicas lagging behind). The
//! aggregator pushes every arriving business through a [`Deduper`] so each id
//! appears at most once in a response.

use crate::model::Business;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Order two occurrences of the same business: an annotated one beats an
/// unannotated one, and a smaller distance beats a larger one.
fn closer(candidate: &Business, existing: &Business) -> bool {
    match (candidate.distance_km(), existing.distance_km()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Less),
        (Some(_), None) => true,
        _ => false,
    }
}

/// Incremental dedup by business id, keeping the closest occurrence.
///
/// Output preserves first-arrival order.
#[derive(Debug, Default)]
pub struct Deduper {
    index: FxHashMap<String, usize>,
    items: Vec<Business>,
    duplicates: usize,
}

impl Deduper {
    /// Create an empty deduper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a business.
    pub fn push(&mut self, business: Business) {
        match self.index.get(&business.id) {
            Some(&pos) => {
                self.duplicates += 1;
                if closer(&business, &self.items[pos]) {
                    self.items[pos] = business;
                }
            }
            None => {
                self.index.insert(business.id.clone(), self.items.len());
                self.items.push(business);
            }
        }
    }

    /// Number of unique businesses so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of pushes that hit an id already seen.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Finalize and return the unique businesses.
    pub fn finish(self) -> Vec<Business> {
        self.items
    }
}
