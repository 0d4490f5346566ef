//! Error types for the nearby query engine.

use thiserror::Error;

/// Errors raised by a [`BusinessStore`](crate::BusinessStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached at all (connection not established).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A retrieval was issued but failed (transient or permanent).
    #[error("Store query failed: {0}")]
    Query(String),

    /// IO error while loading seed data.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed data was not valid JSON or had the wrong shape.
    #[error("Invalid seed data: {0}")]
    Seed(String),
}

/// Query engine errors.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Latitude or longitude outside the valid range (or not finite).
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Grid resolution outside 0..=15.
    #[error("Invalid grid resolution: {0}")]
    InvalidResolution(u8),

    /// A cell identifier string could not be parsed.
    #[error("Invalid cell identifier: {0}")]
    InvalidCell(String),

    /// The backing store could not be reached. Fatal to the request.
    #[error("Upstream unavailable: {0}")]
    Upstream(#[source] StoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
