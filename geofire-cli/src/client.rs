//! HTTP client for the GeoFire server

use geofire_query::{QueryRequest, QueryResponse};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// Header the server uses to report query time
const ELAPSED_HEADER: &str = "x-query-elapsed-ms";

/// Client for the nearby query API.
#[derive(Clone)]
pub struct NearbyClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for NearbyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearbyClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.auth_token.is_some())
            .finish()
    }
}

/// Error type for client operations.
#[derive(Debug)]
pub enum ClientError {
    /// Network or connection error
    Network(String),
    /// Request did not complete before the client timeout
    Timeout(Duration),
    /// 401 Unauthorized (includes server message if any)
    Unauthorized(String),
    /// 400 Bad Request (includes server error message)
    BadRequest(String),
    /// 503 Service Unavailable: the server cannot reach its store
    Unavailable(String),
    /// Other non-2xx status
    ServerError(String),
    /// Response could not be parsed as expected
    InvalidResponse(String),
    /// The HTTP client could not be constructed
    Setup(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "network error: {msg}"),
            ClientError::Timeout(after) => {
                write!(f, "no response within {}s", after.as_secs())
            }
            ClientError::Unauthorized(msg) => write!(
                f,
                "authentication failed (401): {msg}\n  \
                 Pass a valid token with --token or GEOFIRE_TOKEN."
            ),
            ClientError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            ClientError::Unavailable(msg) => write!(f, "server cannot reach its store: {msg}"),
            ClientError::ServerError(msg) => write!(f, "server error: {msg}"),
            ClientError::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            ClientError::Setup(msg) => write!(f, "failed to build HTTP client: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// A nearby response plus the server-reported query time.
#[derive(Debug, Clone)]
pub struct NearbyResult {
    pub response: QueryResponse,
    pub elapsed_ms: Option<u64>,
}

impl NearbyClient {
    /// Create a new client.
    ///
    /// `base_url` is the server root (e.g., `http://127.0.0.1:10000`).
    /// Trailing slashes are stripped. `timeout` bounds every request.
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.auth_token {
            req.bearer_auth(token)
        } else {
            req
        }
    }

    /// Map a non-2xx response to a `ClientError`, preferring the `error`
    /// field of the server's JSON body.
    async fn map_error(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("status {status}")
                } else {
                    body
                }
            });

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
            StatusCode::SERVICE_UNAVAILABLE => ClientError::Unavailable(message),
            _ => ClientError::ServerError(format!("{status}: {message}")),
        }
    }

    /// Map a reqwest error (network/timeout) to a `ClientError`.
    fn map_network_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else if e.is_connect() {
            ClientError::Network(format!("connection to {} failed: {e}", self.base_url))
        } else {
            ClientError::Network(e.to_string())
        }
    }

    /// Run a nearby query.
    pub async fn nearby(&self, request: &QueryRequest) -> Result<NearbyResult, ClientError> {
        let url = format!("{}/v1/businesses/nearby", self.base_url);
        tracing::debug!(
            %url,
            latitude = request.geo_point.latitude,
            longitude = request.geo_point.longitude,
            "sending nearby query"
        );

        let resp = self
            .add_auth(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_network_error(e))?;

        if !resp.status().is_success() {
            return Err(Self::map_error(resp).await);
        }

        let elapsed_ms = resp
            .headers()
            .get(ELAPSED_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let response = resp
            .json::<QueryResponse>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        Ok(NearbyResult {
            response,
            elapsed_ms,
        })
    }

    /// GET a JSON document from the server.
    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .add_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.map_network_error(e))?;

        if resp.status().is_success() {
            resp.json()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    /// Server health document.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get_json("/health").await
    }

    /// Server query counters.
    pub async fn stats(&self) -> Result<serde_json::Value, ClientError> {
        self.get_json("/v1/stats").await
    }
}
