//! Session state machine and controller.
//!
//! `SessionController` is the single source of truth for the client's
//! authentication state. It owns every identity-provider interaction,
//! persists the token bundle through a [`CredentialStore`], and publishes
//! state transitions over a watch channel so observers (UI or headless)
//! can react without the controller knowing about them.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::credentials::{CredentialError, CredentialStore, TokenKey};
use super::error::AuthError;
use super::provider::IdentityProvider;
use super::token;

/// Client-side authentication state.
///
/// Exactly one state is active at a time and each variant carries exactly
/// the data its outgoing transitions need, so a state with missing payload
/// cannot be constructed.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    /// A sign-up succeeded and awaits its emailed confirmation code.
    ConfirmingSignUp { email: String, password: String },
    /// The confirmation code was accepted; a completion sign-in finishes
    /// the flow with the credentials carried here.
    Onboarding { email: String, password: String },
    SignedIn { user_id: String },
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }
}

// Hand-written so the passwords carried by the pending states never reach
// logs or test output.
impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::SignedOut => f.write_str("SignedOut"),
            AuthState::ConfirmingSignUp { email, .. } => f
                .debug_struct("ConfirmingSignUp")
                .field("email", email)
                .finish_non_exhaustive(),
            AuthState::Onboarding { email, .. } => f
                .debug_struct("Onboarding")
                .field("email", email)
                .finish_non_exhaustive(),
            AuthState::SignedIn { user_id } => f
                .debug_struct("SignedIn")
                .field("user_id", user_id)
                .finish(),
        }
    }
}

struct Inner {
    provider: IdentityProvider,
    store: Arc<dyn CredentialStore>,
    state_tx: watch::Sender<AuthState>,
}

/// Owns the auth state machine. Clone is cheap and all clones share state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Build a controller over an explicit provider and store.
    ///
    /// Startup is optimistic: a persisted, non-empty access token whose
    /// companion identity token decodes is treated as signed in without a
    /// server round-trip. The token may have expired in the meantime; the
    /// first API call's refresh path recovers from that. Store read
    /// failures fail open to signed-out.
    pub fn new(provider: IdentityProvider, store: Arc<dyn CredentialStore>) -> Self {
        let initial = Self::startup_state(store.as_ref());
        info!(state = ?initial, "session restored");
        let (state_tx, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                state_tx,
            }),
        }
    }

    fn startup_state(store: &dyn CredentialStore) -> AuthState {
        let has_access = matches!(
            store.read(TokenKey::Access),
            Ok(Some(token)) if !token.is_empty()
        );
        if !has_access {
            return AuthState::SignedOut;
        }
        match store.read(TokenKey::Id).unwrap_or_default() {
            Some(id_token) => match token::subject(&id_token) {
                Ok(user_id) => AuthState::SignedIn { user_id },
                Err(e) => {
                    warn!(error = %e, "persisted identity token unusable, starting signed out");
                    AuthState::SignedOut
                }
            },
            None => AuthState::SignedOut,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe state transitions. Works headlessly; dropping the receiver
    /// detaches the observer without affecting the controller.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// The signed-in user's id, derived from the identity token's subject.
    pub fn user_id(&self) -> Option<String> {
        match self.state() {
            AuthState::SignedIn { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// Pure store read; no network call, no state change. An unavailable
    /// store reads as absent.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .store
            .read(TokenKey::Access)
            .unwrap_or_default()
            .filter(|token| !token.is_empty())
    }

    /// Register a new account and move to `ConfirmingSignUp`.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.inner
            .provider
            .sign_up(email, password)
            .await
            .map_err(|e| AuthError::SignUpFailed(e.to_string()))?;
        self.set_state(AuthState::ConfirmingSignUp {
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(())
    }

    /// Verify the emailed confirmation code.
    ///
    /// A confirmed pending sign-up moves to `Onboarding`; the completion
    /// sign-in then uses the credentials that state already carries. On
    /// failure the state stays put and the error is returned.
    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), AuthError> {
        self.inner
            .provider
            .confirm_sign_up(email, code)
            .await
            .map_err(|e| AuthError::ConfirmationFailed(e.to_string()))?;
        if let AuthState::ConfirmingSignUp {
            email: pending,
            password,
        } = self.state()
        {
            if pending == email {
                self.set_state(AuthState::Onboarding {
                    email: pending,
                    password,
                });
            }
        }
        Ok(())
    }

    /// Exchange credentials for the token bundle and move to `SignedIn`.
    ///
    /// All three tokens are required; a response missing any one of them is
    /// a failure, not a partial success. A failed completion sign-in from
    /// `Onboarding` abandons the flow back to `SignedOut`; any other
    /// failure leaves the state unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.try_sign_in(email, password).await {
            Ok(user_id) => {
                self.set_state(AuthState::SignedIn { user_id });
                Ok(())
            }
            Err(e) => {
                if matches!(self.state(), AuthState::Onboarding { .. }) {
                    self.clear_session();
                }
                Err(e)
            }
        }
    }

    async fn try_sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let tokens = self
            .inner
            .provider
            .password_auth(email, password)
            .await
            .map_err(|e| AuthError::SignInFailed(e.to_string()))?;

        let (Some(access), Some(id), Some(refresh)) =
            (tokens.access_token, tokens.id_token, tokens.refresh_token)
        else {
            return Err(AuthError::SignInFailed("missing tokens".to_string()));
        };

        let user_id =
            token::subject(&id).map_err(|e| AuthError::SignInFailed(e.to_string()))?;

        self.inner.store.save(TokenKey::Access, &access)?;
        self.inner.store.save(TokenKey::Id, &id)?;
        self.inner.store.save(TokenKey::Refresh, &refresh)?;
        Ok(user_id)
    }

    /// Trade the persisted refresh token for fresh access and identity
    /// tokens.
    ///
    /// Requires a persisted refresh token; without one this returns
    /// `NotSignedIn` and performs no network call. The response may omit a
    /// new refresh token, in which case the prior one stays in place. Any
    /// failure clears the whole session and lands in `SignedOut` (fail
    /// closed) before raising `TokenRefreshFailed`.
    pub async fn refresh_tokens(&self) -> Result<(), AuthError> {
        let refresh = self
            .inner
            .store
            .read(TokenKey::Refresh)
            .unwrap_or_default()
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NotSignedIn)?;

        let tokens = match self.inner.provider.refresh_auth(&refresh).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "token refresh failed, signing out");
                self.clear_session();
                return Err(AuthError::TokenRefreshFailed);
            }
        };

        let (Some(access), Some(id)) = (tokens.access_token, tokens.id_token) else {
            warn!("refresh response missing tokens, signing out");
            self.clear_session();
            return Err(AuthError::TokenRefreshFailed);
        };

        if let Err(e) = self.persist_refreshed(&access, &id, tokens.refresh_token.as_deref()) {
            warn!(error = %e, "failed to persist refreshed tokens, signing out");
            self.clear_session();
            return Err(AuthError::TokenRefreshFailed);
        }
        Ok(())
    }

    fn persist_refreshed(
        &self,
        access: &str,
        id: &str,
        refresh: Option<&str>,
    ) -> Result<(), CredentialError> {
        self.inner.store.save(TokenKey::Access, access)?;
        self.inner.store.save(TokenKey::Id, id)?;
        if let Some(refresh) = refresh {
            self.inner.store.save(TokenKey::Refresh, refresh)?;
        }
        Ok(())
    }

    /// Clear the session. Always succeeds; no network call.
    pub fn sign_out(&self) {
        info!("signing out");
        self.clear_session();
    }

    /// Start a password reset; stateless.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.inner
            .provider
            .forgot_password(email)
            .await
            .map_err(|e| AuthError::ResetPasswordFailed(e.to_string()))
    }

    /// Complete a password reset with the emailed code; stateless.
    pub async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.inner
            .provider
            .confirm_forgot_password(email, code, new_password)
            .await
            .map_err(|e| AuthError::ResetPasswordFailed(e.to_string()))
    }

    fn clear_session(&self) {
        if let Err(e) = self.inner.store.delete_all() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        self.set_state(AuthState::SignedOut);
    }

    // Last writer wins when concurrently-completing operations race; the
    // transition itself is the only externally-visible ordering guarantee.
    fn set_state(&self, next: AuthState) {
        let prev = self.inner.state_tx.send_replace(next.clone());
        if prev != next {
            info!(from = ?prev, to = ?next, "auth state transition");
        }
    }
}
