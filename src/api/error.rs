//! Transport-layer error taxonomy for backend API calls.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request URL")]
    InvalidUrl,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unauthorized - please sign in again")]
    Unauthorized,

    #[error("resource not found")]
    NotFound,

    #[error("{0}")]
    ServerError(String),

    #[error("failed to decode response: {0}")]
    DecodingError(#[from] serde_json::Error),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Map a non-2xx, non-401 status to the taxonomy. 401 is handled by the
    /// refresh-retry path in the client and never reaches this mapping.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            400..=499 => match serde_json::from_str::<ErrorBody>(body) {
                Ok(ErrorBody { error: Some(message) }) => ApiError::ServerError(message),
                _ => ApiError::ServerError(format!("client error: {}", status.as_u16())),
            },
            500..=599 => ApiError::ServerError(format!("server error: {}", status.as_u16())),
            _ => ApiError::InvalidResponse(format!(
                "unexpected status {}: {}",
                status.as_u16(),
                Self::truncate_body(body)
            )),
        }
    }
}
