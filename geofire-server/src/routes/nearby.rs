//! Nearby-business query endpoint

use super::ELAPSED_HEADER;
use crate::error::{Result, ServerError};
use crate::extract::MaybeBearer;
use crate::state::AppState;
use crate::telemetry::{create_request_span, extract_request_id};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use geofire_query::QueryRequest;
use std::sync::Arc;
use tracing::Instrument;

/// Nearby query endpoint
///
/// POST /v1/businesses/nearby
///
/// Body: `{"geoPoint": {"latitude": .., "longitude": ..}, "filterDistance": .., "orderBy": ..}`.
/// Responds with `{"businesses": [...]}` and the `x-query-elapsed-ms` header.
pub async fn nearby(
    State(state): State<Arc<AppState>>,
    bearer: MaybeBearer,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = extract_request_id(&headers, &state.telemetry_config);
    let span = create_request_span("nearby", request_id.as_deref());
    if let Some(subject) = bearer.subject() {
        span.record("subject", subject);
    }

    let result = run_nearby(&state, &body).instrument(span.clone()).await;
    match result {
        Ok(response) => {
            span.record("status", 200u16);
            response
        }
        Err(e) => {
            span.record("status", e.status_code().as_u16());
            state.metrics.record_rejection();
            let _guard = span.enter();
            e.into_response()
        }
    }
}

async fn run_nearby(state: &AppState, body: &[u8]) -> Result<Response> {
    if body.is_empty() {
        return Err(ServerError::bad_request("missing request body"));
    }
    let request: QueryRequest = serde_json::from_slice(body)?;

    let outcome = state.engine.execute(&request).await?;
    let elapsed_ms = outcome.stats.elapsed.as_millis().to_string();

    tracing::info!(
        results = outcome.stats.result_count,
        partial = outcome.stats.deadline_exceeded,
        elapsed_ms = %elapsed_ms,
        "nearby query served"
    );

    Ok(([(ELAPSED_HEADER, elapsed_ms)], Json(outcome.response)).into_response())
}
