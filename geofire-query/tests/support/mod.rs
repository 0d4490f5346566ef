//! Shared fixtures for query engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use geofire_query::grid::{self, cell_of, CellId, COARSE_RESOLUTION, FINE_RESOLUTION};
use geofire_query::memory::DEFAULT_COLLECTION;
use geofire_query::{
    BusinessStore, CellQuery, GeoPoint, MemoryStore, RecordStream, StoreError, StoredRecord,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const AUSTIN_LAT: f64 = 30.2651242;
pub const AUSTIN_LNG: f64 = -97.7308078;

pub fn austin() -> GeoPoint {
    GeoPoint::new(AUSTIN_LAT, AUSTIN_LNG).unwrap()
}

/// The seven coarse cells around the reference point.
pub fn austin_ring() -> Vec<CellId> {
    let center = cell_of(austin(), COARSE_RESOLUTION).unwrap();
    grid::ring(center, 1)
}

/// A business document located at `point`.
pub fn business_at(id: &str, name: &str, point: GeoPoint) -> StoredRecord {
    StoredRecord::new(
        id,
        json!({
            "name": name,
            "category": "food",
            "h3index7": cell_of(point, COARSE_RESOLUTION).unwrap().to_string(),
            "h3index15": cell_of(point, FINE_RESOLUTION).unwrap().to_string(),
        }),
    )
}

/// A business document located at the centroid of `cell`.
pub fn business_in(id: &str, cell: CellId) -> StoredRecord {
    business_at(id, &format!("Business {id}"), grid::to_point(cell))
}

/// Store with `per_cell` businesses in every ring cell, plus decoys two rings out.
pub fn seeded_ring_store(per_cell: usize) -> (MemoryStore, HashSet<String>) {
    let store = MemoryStore::new();
    let mut expected = HashSet::new();

    for (c, cell) in austin_ring().into_iter().enumerate() {
        for i in 0..per_cell {
            let id = format!("ring-{c}-{i}");
            store.insert(DEFAULT_COLLECTION, business_in(&id, cell)).unwrap();
            expected.insert(id);
        }
    }

    let center = cell_of(austin(), COARSE_RESOLUTION).unwrap();
    let near: HashSet<CellId> = austin_ring().into_iter().collect();
    let far = grid::ring(center, 3).into_iter().filter(|c| !near.contains(c));
    for (i, cell) in far.enumerate() {
        let id = format!("far-{i}");
        store.insert(DEFAULT_COLLECTION, business_in(&id, cell)).unwrap();
    }

    (store, expected)
}

/// How a [`ScriptedStore`] treats queries for a given cell.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail: HashSet<String>,
    pub hang: HashSet<String>,
    pub panic: HashSet<String>,
    pub fail_stream_after_first: HashSet<String>,
    pub hang_after_first: HashSet<String>,
}

/// Wraps a [`MemoryStore`] and misbehaves for selected cells.
pub struct ScriptedStore {
    pub inner: MemoryStore,
    pub script: Script,
    pub queries: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore, script: Script) -> Self {
        Self {
            inner,
            script,
            queries: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BusinessStore for ScriptedStore {
    async fn check_connection(&self) -> Result<(), StoreError> {
        self.inner.check_connection().await
    }

    async fn query(&self, query: CellQuery) -> Result<RecordStream, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.script.panic.contains(&query.value) {
            panic!("scripted panic for {}", query.value);
        }
        if self.script.hang.contains(&query.value) {
            futures::future::pending::<()>().await;
        }
        if self.script.fail.contains(&query.value) {
            return Err(StoreError::Query(format!("scripted failure for {}", query.value)));
        }

        let fail_after_first = self.script.fail_stream_after_first.contains(&query.value);
        let hang_after_first = self.script.hang_after_first.contains(&query.value);
        let stream = self.inner.query(query).await?;
        if hang_after_first {
            return Ok(stream.take(1).chain(futures::stream::pending()).boxed());
        }
        if fail_after_first {
            let failing = stream.take(1).chain(futures::stream::once(async {
                Err::<StoredRecord, StoreError>(StoreError::Query("scripted stream failure".into()))
            }));
            return Ok(failing.boxed());
        }
        Ok(stream)
    }
}

/// Returns the same record for every cell.
pub struct EchoStore {
    pub record: StoredRecord,
}

#[async_trait]
impl BusinessStore for EchoStore {
    async fn check_connection(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query(&self, _query: CellQuery) -> Result<RecordStream, StoreError> {
        let record = self.record.clone();
        Ok(futures::stream::iter(vec![Ok(record)]).boxed())
    }
}
