//! Logging setup and per-request span helpers

use crate::config::ServerConfig;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Primary log filter (RUST_LOG env var)
    pub log_filter: String,
    /// Fallback log level if RUST_LOG not set
    pub default_level: String,
    /// Request ID header name (default: "x-request-id")
    pub request_id_header: String,
    /// Log format ("human" or "json")
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl TelemetryConfig {
    /// Create telemetry config honoring the server's `--log-level`
    pub fn with_server_config(server_config: &ServerConfig) -> Self {
        let default_level =
            env::var("LOG_LEVEL").unwrap_or_else(|_| server_config.log_level.clone());
        Self::from_env_with_defaults(default_level)
    }

    fn from_env_with_defaults(default_level: String) -> Self {
        Self {
            log_filter: env::var("RUST_LOG").unwrap_or_default(),
            default_level,
            request_id_header: env::var("LOG_REQUEST_ID_HEADER")
                .unwrap_or_else(|_| "x-request-id".to_string()),
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default()),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let default_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self::from_env_with_defaults(default_level)
    }
}

fn parse_log_format(value: &str) -> LogFormat {
    match value.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Human,
    }
}

/// Initialize logging
///
/// Safe to call multiple times - will only initialize once.
pub fn init_logging(config: &TelemetryConfig) {
    // Check if a global subscriber is already set (e.g., from tests)
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("tracing subscriber already initialized, skipping");
        return;
    }

    let filter = if config.log_filter.is_empty() {
        EnvFilter::new(&config.default_level)
    } else {
        EnvFilter::new(&config.log_filter)
    };

    // "json" stays compact until the subscriber's json feature is enabled.
    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .boxed(),
        LogFormat::Human => tracing_subscriber::fmt::layer().boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Extract request ID from headers
///
/// Checks the configured header first, then `x-amzn-trace-id` and
/// `x-trace-id`.
pub fn extract_request_id(
    headers: &axum::http::HeaderMap,
    config: &TelemetryConfig,
) -> Option<String> {
    [
        config.request_id_header.as_str(),
        "x-amzn-trace-id",
        "x-trace-id",
    ]
    .into_iter()
    .find_map(|name| headers.get(name)?.to_str().ok().map(str::to_string))
}

/// Create the span for one nearby request
pub fn create_request_span(operation: &str, request_id: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "request",
        operation = operation,
        request_id = request_id.unwrap_or(""),
        subject = tracing::field::Empty,
        status = tracing::field::Empty,
    )
}
