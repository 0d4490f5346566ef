//! Bearer token extraction for the query endpoint
//!
//! # Modes
//! - `None`: Token ignored entirely (no parsing, no logging)
//! - `Optional`: Accept tokens but don't require (invalid token = 401)
//! - `Required`: Must have valid token (missing token = 401)

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, AUTHORIZATION};
use axum::http::request::Parts;
use std::sync::Arc;

use crate::config::AuthMode;
use crate::error::ServerError;
use crate::state::AppState;
use crate::token_verify::{verify_bearer_token, VerifiedToken};

/// Optional verified token.
///
/// `MaybeBearer(None)` means no token was presented (or auth is off).
#[derive(Debug)]
pub struct MaybeBearer(pub Option<VerifiedToken>);

impl MaybeBearer {
    /// Verified subject, if any
    pub fn subject(&self) -> Option<&str> {
        self.0.as_ref().and_then(|t| t.subject.as_deref())
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeBearer {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = state.config.auth();

        if auth.mode == AuthMode::None {
            return Ok(MaybeBearer(None));
        }

        let Some(token) = extract_bearer_token(&parts.headers) else {
            return if auth.is_required() {
                Err(ServerError::unauthorized("Bearer token required"))
            } else {
                Ok(MaybeBearer(None))
            };
        };

        // A presented token is always verified, even in Optional mode
        verify_bearer_token(&token, &auth).map(|t| MaybeBearer(Some(t)))
    }
}

/// Extract bearer token with HTTP-standard tolerance:
/// - Case-insensitive scheme ("Bearer", "bearer", "BEARER")
/// - Trim leading/trailing whitespace from header and token
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = auth.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
