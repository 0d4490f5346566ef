//! Server error types with HTTP status code mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geofire_query::{QueryError, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Compact error type identifiers carried in the `@type` field
pub mod error_types {
    pub const INVALID_COORDINATE: &str = "err:geo/InvalidCoordinate";
    pub const JSON_PARSE: &str = "err:json/Parse";
    pub const BAD_REQUEST: &str = "err:api/BadRequest";
    pub const UNAUTHORIZED: &str = "err:auth/Unauthorized";
    pub const UPSTREAM: &str = "err:store/Unavailable";
    pub const CONFIG: &str = "err:system/Config";
    pub const INTERNAL: &str = "err:system/Internal";
}

/// Errors returned by request handlers
#[derive(Error, Debug)]
pub enum ServerError {
    /// Query engine error
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Request body was not valid JSON for the endpoint
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bearer token required or invalid
    #[error("{0}")]
    Unauthorized(String),
}

impl ServerError {
    /// Map error to error type identifier
    pub fn error_type(&self) -> &'static str {
        use error_types::*;

        match self {
            ServerError::Query(QueryError::InvalidCoordinate { .. }) => INVALID_COORDINATE,
            ServerError::Query(QueryError::Upstream(_)) => UPSTREAM,
            ServerError::Query(QueryError::InvalidResolution(_)) => CONFIG,
            ServerError::Query(QueryError::Config(_)) => CONFIG,
            ServerError::Query(QueryError::InvalidCell(_)) => INTERNAL,
            ServerError::Json(_) => JSON_PARSE,
            ServerError::BadRequest(_) => BAD_REQUEST,
            ServerError::Unauthorized(_) => UNAUTHORIZED,
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 - Bad Request (client errors)
            ServerError::Query(QueryError::InvalidCoordinate { .. }) => StatusCode::BAD_REQUEST,
            ServerError::Json(_) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // 401 - Unauthorized
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 503 - backing store unreachable
            ServerError::Query(QueryError::Upstream(_)) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 - Internal Server Error (server-side errors and catch-all)
            ServerError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServerError::BadRequest(msg.into())
    }

    /// Create an unauthorized error (401)
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ServerError::Unauthorized(msg.into())
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// HTTP status code
    pub status: u16,
    /// Error type (compact identifier, e.g. "err:geo/InvalidCoordinate")
    #[serde(rename = "@type")]
    pub error_type: String,
    /// Optional cause for wrapped errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorResponse>>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let cause = extract_cause(&self);

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
            error_type: error_type.to_string(),
            cause,
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"{}","status":{},"@type":"{}"}}"#,
                error_type,
                status.as_u16(),
                error_type
            )
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}

/// Extract a cause for the cases where the wrapped error adds information
fn extract_cause(error: &ServerError) -> Option<Box<ErrorResponse>> {
    match error {
        ServerError::Query(QueryError::Upstream(store_err)) => {
            let error_type = match store_err {
                StoreError::Unavailable(_) => error_types::UPSTREAM,
                _ => error_types::INTERNAL,
            };
            Some(Box::new(ErrorResponse {
                error: store_err.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                error_type: error_type.to_string(),
                cause: None,
            }))
        }

        ServerError::Json(json_err) => Some(Box::new(ErrorResponse {
            error: format!("at line {}, column {}", json_err.line(), json_err.column()),
            status: 400,
            error_type: error_types::JSON_PARSE.to_string(),
            cause: None,
        })),

        _ => None,
    }
}

/// Errors that prevent the server from starting
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load business data: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build query engine: {0}")]
    Engine(#[from] QueryError),

    #[error("Failed to serve on listen address: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
