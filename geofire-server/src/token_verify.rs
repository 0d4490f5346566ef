//! Bearer token verification (HS256 JWT).
//!
//! The verified subject is attached to the request span for logging; it does
//! not change what a query returns.

use crate::config::AuthConfig;
use crate::error::ServerError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Claims read from a verified token
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    iss: Option<String>,
}

/// Result of token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// `sub` claim
    pub subject: Option<String>,
    /// `iss` claim
    pub issuer: Option<String>,
}

/// Verify a bearer token against the configured secret and issuer.
///
/// Requires a valid signature and an unexpired `exp` claim. When an issuer
/// is configured, `iss` must match it.
pub fn verify_bearer_token(token: &str, auth: &AuthConfig) -> Result<VerifiedToken, ServerError> {
    let secret = auth
        .secret
        .as_deref()
        .ok_or_else(|| ServerError::unauthorized("Token verification is not configured"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = auth.issuer.as_deref() {
        validation.set_issuer(&[issuer]);
    }

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| ServerError::unauthorized(format!("Invalid token: {}", e)))?;

    Ok(VerifiedToken {
        subject: data.claims.sub,
        issuer: data.claims.iss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        iss: &'a str,
        exp: u64,
    }

    const FAR_FUTURE: u64 = 4_102_444_800; // 2100-01-01

    fn token(secret: &str, iss: &str, exp: u64) -> String {
        let claims = TestClaims {
            sub: "user-42",
            iss,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn auth(issuer: Option<&str>) -> AuthConfig {
        AuthConfig {
            mode: AuthMode::Required,
            secret: Some("s3cret".to_string()),
            issuer: issuer.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_token() {
        let verified = verify_bearer_token(&token("s3cret", "geofire", FAR_FUTURE), &auth(None))
            .unwrap();
        assert_eq!(verified.subject.as_deref(), Some("user-42"));
        assert_eq!(verified.issuer.as_deref(), Some("geofire"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let err =
            verify_bearer_token(&token("other", "geofire", FAR_FUTURE), &auth(None)).unwrap_err();
        assert!(matches!(err, ServerError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_rejected() {
        assert!(verify_bearer_token(&token("s3cret", "geofire", 1_000), &auth(None)).is_err());
    }

    #[test]
    fn test_issuer_checked() {
        let t = token("s3cret", "someone-else", FAR_FUTURE);
        assert!(verify_bearer_token(&t, &auth(Some("geofire"))).is_err());
        let t = token("s3cret", "geofire", FAR_FUTURE);
        assert!(verify_bearer_token(&t, &auth(Some("geofire"))).is_ok());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verify_bearer_token("not.a.jwt", &auth(None)).is_err());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let config = AuthConfig::default();
        assert!(verify_bearer_token(&token("s3cret", "g", FAR_FUTURE), &config).is_err());
    }
}
