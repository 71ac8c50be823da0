//! Bearer token payload decoding.
//!
//! Tokens are JWTs issued by the gateway. The client never verifies the
//! signature; it only reads `exp` from the payload to decide whether a stored
//! token is still worth sending. Expiry is compared against a caller-supplied
//! `now` rather than by `jsonwebtoken` itself.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("Token is not a header.payload.signature JWT")]
    Malformed,

    #[error("Token segment is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("Token segment is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Claims the client cares about. Everything else in the payload is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as a UNIX timestamp in seconds. Fractional values are allowed.
    pub exp: f64,
}

/// Payload-only validation: no signature, no audience, no built-in expiry.
/// A missing `exp` still fails when deserializing into `TokenClaims`.
fn payload_only() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    // The built-in `exp` requirement only accepts integers
    validation.required_spec_claims = HashSet::new();
    validation
}

impl TokenClaims {
    /// Decode the payload of a JWT without verifying it
    pub fn decode(token: &str) -> Result<Self, ClaimsError> {
        let key = DecodingKey::from_secret(&[]);
        jsonwebtoken::decode::<TokenClaims>(token, &key, &payload_only())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken => ClaimsError::Malformed,
                ErrorKind::Base64(inner) => ClaimsError::InvalidEncoding(inner.to_string()),
                ErrorKind::Json(inner) => ClaimsError::InvalidJson(inner.to_string()),
                _ => ClaimsError::InvalidJson(e.to_string()),
            })
    }

    /// A token is expired once its `exp` is strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp() as f64
    }

    /// Whole seconds left, negative once expired
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp() as f64).floor() as i64
    }
}

/// Encode an unsigned-looking token carrying the given raw payload text.
#[cfg(test)]
pub(crate) fn test_token(payload: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload);
    format!("{}.{}.signature", header, body)
}

/// Sign a token that expires at `exp`. The key is irrelevant to the client.
#[cfg(test)]
pub(crate) fn test_token_expiring_at(exp: i64) -> String {
    use jsonwebtoken::{EncodingKey, Header};

    let claims = serde_json::json!({ "sub": "1", "exp": exp });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"gateway-secret"),
    )
    .unwrap()
}
