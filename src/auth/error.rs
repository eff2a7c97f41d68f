//! Session-layer error taxonomy.
//!
//! Provider-call failures are caught at the session boundary and re-wrapped
//! here with a human-readable message; raw transport errors never leak past
//! this layer.

use thiserror::Error;

use super::credentials::CredentialError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign up failed: {0}")]
    SignUpFailed(String),

    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),

    #[error("sign in failed: {0}")]
    SignInFailed(String),

    /// The refresh flow failed; the session has been cleared and the state
    /// machine is back in `SignedOut` (fail closed).
    #[error("token refresh failed")]
    TokenRefreshFailed,

    #[error("password reset failed: {0}")]
    ResetPasswordFailed(String),

    /// The operation needs a signed-in session and none exists.
    #[error("not signed in")]
    NotSignedIn,

    /// Token persistence failed mid-operation.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}
