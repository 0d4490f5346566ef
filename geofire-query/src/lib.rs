//! H3 ring fan-out query engine for nearby businesses.
//!
//! Given a coordinate, the engine finds the H3 cell containing it, expands
//! that cell to its ring of neighbors, queries every cell concurrently, and
//! returns the merged set of businesses annotated with their haversine
//! distance from the coordinate.
//!
//! # Architecture
//!
//! ```text
//!   QueryRequest
//!        │
//!        ▼
//!   NearbyQueryEngine ── check_connection ──► BusinessStore
//!        │
//!        ▼
//!   grid::cell_of ──► grid::ring (center + neighbors)
//!        │
//!        ▼
//!   FanOutAggregator ── one task per cell ──► CellQueryExecutor
//!        │                                        │ query(h3index7 == cell, limit 20)
//!        │                                        │ decode + haversine to origin
//!        │◄──────────── mpsc<Business> ───────────┘
//!        ▼
//!   Deduper (by id) ──► QueryResponse + QueryStats
//! ```
//!
//! # Modules
//!
//! - [`geo`]: coordinates and haversine distance
//! - [`grid`]: H3 cell lookup, ring expansion, centroids
//! - [`store`]: the read-only store trait and record decoding
//! - [`memory`]: in-memory store seeded from JSON
//! - [`executor`]: per-cell retrieval
//! - [`aggregate`]: concurrent fan-out with deadline
//! - [`engine`]: the entry point
//! - [`config`]: engine configuration
//! - [`telemetry`]: per-query statistics and sinks
//! - [`error`]: error types

pub mod aggregate;
pub mod config;
pub(crate) mod dedup;
pub mod engine;
pub mod error;
pub mod executor;
pub mod geo;
pub mod grid;
pub mod memory;
pub mod model;
pub mod store;
pub mod telemetry;

pub use aggregate::{Aggregation, FanOutAggregator};
pub use config::{MalformedRecordPolicy, QueryConfig};
pub use engine::{NearbyQueryEngine, QueryOutcome};
pub use error::{QueryError, Result, StoreError};
pub use executor::{BranchOutcome, BranchReport, CellQueryExecutor};
pub use geo::{haversine, Distance, GeoPoint};
pub use grid::{CellId, COARSE_RESOLUTION, FINE_RESOLUTION};
pub use memory::MemoryStore;
pub use model::{Business, FilterDistance, OrderBy, QueryRequest, QueryResponse};
pub use store::{BusinessStore, CellField, CellQuery, RecordStream, StoredRecord};
pub use telemetry::{QueryStats, TelemetrySink, TracingTelemetry};
