//! Backing store boundary.
//!
//! The engine only ever reads from the store: one filtered, bounded query per
//! grid cell. [`BusinessStore`] abstracts over where the records live so the
//! fan-out works identically against the in-memory store or a remote
//! document database.
//!
//! Records come back as loosely typed documents. Decoding into a
//! [`Business`] and reading the cell fields happens here, at the boundary, so
//! the executor only deals with typed values and explicit
//! absent/present/malformed states.

use crate::error::StoreError;
use crate::grid::CellId;
use crate::model::Business;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};

/// Lazily produced records for one query. Finite and not restartable.
pub type RecordStream = BoxStream<'static, Result<StoredRecord, StoreError>>;

/// An equality-filtered, limited retrieval against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellQuery {
    pub collection: String,
    pub field: String,
    pub value: String,
    pub limit: usize,
}

/// Read-only business store.
///
/// Implementations are shared across all branches of all concurrent
/// requests, so they must be safe to call concurrently.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Check that the store is reachable.
    ///
    /// Called once per request before the fan-out; an error here is the only
    /// failure surfaced to the caller.
    async fn check_connection(&self) -> Result<(), StoreError>;

    /// Records whose `query.field` equals `query.value`, at most
    /// `query.limit` of them.
    async fn query(&self, query: CellQuery) -> Result<RecordStream, StoreError>;
}

/// Business fields derived at query time, never read from a document.
const COMPUTED_FIELDS: &[&str] = &["id", "distance", "locationCell"];

/// A raw document from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Document key.
    pub id: String,
    /// Document fields.
    pub data: Map<String, Value>,
}

/// State of a stored cell identifier field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellField {
    /// Field missing or null.
    Absent,
    /// Field holds a parseable cell identifier.
    Present(CellId),
    /// Field is not a string, or the string is not a cell identifier.
    Malformed(String),
}

impl CellField {
    /// Read `field` from a document.
    pub fn read(data: &Map<String, Value>, field: &str) -> Self {
        match data.get(field) {
            None | Some(Value::Null) => CellField::Absent,
            Some(Value::String(s)) => match s.parse::<CellId>() {
                Ok(cell) => CellField::Present(cell),
                Err(_) => CellField::Malformed(s.clone()),
            },
            Some(other) => CellField::Malformed(other.to_string()),
        }
    }

    /// The cell, if present.
    pub fn cell(&self) -> Option<CellId> {
        match self {
            CellField::Present(cell) => Some(*cell),
            _ => None,
        }
    }
}

/// A record that decoded into a business.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub business: Business,
    pub location: CellField,
}

impl StoredRecord {
    /// Create a record from a JSON object. Non-object values become empty
    /// documents.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode into a [`Business`].
    ///
    /// The coarse and fine cell fields are removed from the pass-through
    /// attributes; the fine one is returned as a typed [`CellField`]. Stored
    /// keys that name computed fields are ignored: the id is the record key
    /// and the distance is only ever attached per query.
    pub fn decode(
        &self,
        coarse_field: &str,
        fine_field: &str,
    ) -> Result<DecodedRecord, serde_json::Error> {
        let mut data = self.data.clone();
        for key in COMPUTED_FIELDS {
            data.remove(*key);
        }
        let mut business: Business = serde_json::from_value(Value::Object(data))?;
        business.id = self.id.clone();
        business.attributes.remove(coarse_field);
        business.attributes.remove(fine_field);

        let location = CellField::read(&self.data, fine_field);
        business.location_cell = location.cell().map(|c| c.to_string());

        Ok(DecodedRecord { business, location })
    }
}
