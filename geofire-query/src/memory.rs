//! In-memory business store.
//!
//! Holds documents per collection and answers equality-filtered queries by
//! scanning. Suitable for tests, demos, and small datasets loaded from a JSON
//! seed file.
//!
//! # Seed format
//!
//! Either an object mapping collection names to arrays of documents, or a
//! bare array (loaded into `businesses`). Each document must carry a string
//! `id`; the remaining fields are stored as-is.
//!
//! ```json
//! {"businesses": [{"id": "b1", "name": "Cafe", "h3index7": "...", "h3index15": "..."}]}
//! ```

use crate::error::StoreError;
use crate::store::{BusinessStore, CellQuery, RecordStream, StoredRecord};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Default collection for bare-array seed files.
pub const DEFAULT_COLLECTION: &str = "businesses";

/// Concurrency-safe in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredRecord>>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Load a store from a JSON seed file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        debug!(path = %path.display(), records = store.len(), "loaded seed file");
        Ok(store)
    }

    /// Load a store from a JSON seed string.
    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StoreError::Seed(e.to_string()))?;
        let store = Self::new();

        match value {
            Value::Array(docs) => store.load_collection(DEFAULT_COLLECTION, docs)?,
            Value::Object(map) => {
                for (collection, docs) in map {
                    match docs {
                        Value::Array(docs) => store.load_collection(&collection, docs)?,
                        _ => {
                            return Err(StoreError::Seed(format!(
                                "collection '{collection}' must be an array"
                            )))
                        }
                    }
                }
            }
            _ => {
                return Err(StoreError::Seed(
                    "seed must be an array or an object of arrays".into(),
                ))
            }
        }

        Ok(store)
    }

    fn load_collection(&self, collection: &str, docs: Vec<Value>) -> Result<(), StoreError> {
        for (i, mut doc) in docs.into_iter().enumerate() {
            let id = doc
                .as_object_mut()
                .and_then(|obj| obj.remove("id"))
                .and_then(|id| id.as_str().map(str::to_string))
                .ok_or_else(|| {
                    StoreError::Seed(format!(
                        "document {i} in '{collection}' has no string id"
                    ))
                })?;
            self.insert(collection, StoredRecord::new(id, doc))?;
        }
        Ok(())
    }

    /// Add a record to a collection.
    pub fn insert(&self, collection: &str, record: StoredRecord) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Query("store lock poisoned".into()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Total number of records across collections.
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl BusinessStore for MemoryStore {
    async fn check_connection(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store marked unavailable".into()))
        }
    }

    async fn query(&self, query: CellQuery) -> Result<RecordStream, StoreError> {
        self.check_connection().await?;

        let records: Vec<StoredRecord> = {
            let collections = self
                .collections
                .read()
                .map_err(|_| StoreError::Query("store lock poisoned".into()))?;

            collections
                .get(&query.collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|r| {
                            r.data.get(&query.field).and_then(Value::as_str)
                                == Some(query.value.as_str())
                        })
                        .take(query.limit)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        Ok(stream::iter(records.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    fn query(value: &str, limit: usize) -> CellQuery {
        CellQuery {
            collection: DEFAULT_COLLECTION.into(),
            field: "h3index7".into(),
            value: value.into(),
            limit,
        }
    }

    #[tokio::test]
    async fn test_filter_and_limit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert(
                    DEFAULT_COLLECTION,
                    StoredRecord::new(format!("a{i}"), json!({"name": "A", "h3index7": "cell-a"})),
                )
                .unwrap();
        }
        store
            .insert(
                DEFAULT_COLLECTION,
                StoredRecord::new("b0", json!({"name": "B", "h3index7": "cell-b"})),
            )
            .unwrap();

        let a: Vec<_> = store.query(query("cell-a", 3)).await.unwrap().try_collect().await.unwrap();
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|r| r.id.starts_with('a')));

        let b: Vec<_> = store.query(query("cell-b", 20)).await.unwrap().try_collect().await.unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].id, "b0");

        let none: Vec<_> = store.query(query("cell-c", 20)).await.unwrap().try_collect().await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_seed_formats() {
        let bare = MemoryStore::from_json_str(r#"[{"id": "x", "name": "X"}]"#).unwrap();
        assert_eq!(bare.len(), 1);

        let keyed = MemoryStore::from_json_str(
            r#"{"businesses": [{"id": "x", "name": "X"}], "other": [{"id": "y"}]}"#,
        )
        .unwrap();
        assert_eq!(keyed.len(), 2);

        assert!(MemoryStore::from_json_str(r#"[{"name": "no id"}]"#).is_err());
        assert!(MemoryStore::from_json_str(r#"{"businesses": 3}"#).is_err());
        assert!(MemoryStore::from_json_str("not json").is_err());
    }

    #[test]
    fn test_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"[{"id": "x", "name": "X"}, {"id": "y", "name": "Y"}]"#).unwrap();

        let store = MemoryStore::from_json_file(&path).unwrap();
        assert_eq!(store.len(), 2);

        assert!(matches!(
            MemoryStore::from_json_file(dir.path().join("missing.json")),
            Err(StoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.check_connection().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.query(query("cell-a", 1)).await.is_err());
    }
}
