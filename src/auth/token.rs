//! Identity-token payload decoding.
//!
//! The identity token is three dot-delimited segments; the middle segment is
//! a base64url-encoded JSON payload carrying the user claims. Only the `sub`
//! claim is extracted here - signature verification is the server's job on
//! every API call, so none is attempted client-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("identity token is not a three-segment token")]
    Malformed,
    #[error("identity token payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("identity token payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("identity token has no subject claim")]
    MissingSubject,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    sub: Option<String>,
}

/// Extract the subject claim (the stable user id) from an identity token.
///
/// Providers emit the payload segment without padding; tokens that arrive
/// padded decode the same way since trailing `=` is stripped first.
pub fn subject(id_token: &str) -> Result<String, TokenError> {
    let mut segments = id_token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => return Err(TokenError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes)?;
    claims.sub.ok_or(TokenError::MissingSubject)
}
