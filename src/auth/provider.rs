//! Identity-provider wire client.
//!
//! Every operation is a single POST to the user-pool endpoint. The operation
//! is selected by the `X-Amz-Target` header and the body is JSON in the
//! `x-amz-json-1.1` protocol. Non-2xx responses carry an error-type field
//! (`__type`) and a message field (`message`, sometimes `Message`); both are
//! folded into a single human-readable string here so raw wire details never
//! travel further up.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Target-header service prefix shared by all user-pool operations
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Wire content type for the AWS JSON protocol
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// HTTP request timeout in seconds.
/// 30s allows for slow provider responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the operation; the message is
    /// `"{errorType}: {message}"` with any namespace prefix stripped.
    #[error("{0}")]
    Service(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Tokens returned by the `InitiateAuth` flows.
///
/// Which fields are present depends on the flow (a refresh does not return a
/// new refresh token), so everything is optional at the wire layer and
/// requiredness is enforced by the session controller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    pub access_token: Option<String>,
    #[serde(rename = "IdToken")]
    pub id_token: Option<String>,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult", default)]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Client for the user-pool identity provider.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct IdentityProvider {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl IdentityProvider {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.provider_endpoint(),
            client_id: config.client_id.clone(),
        })
    }

    /// Register a new user. The confirmation code is delivered out-of-band.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "Password": password,
            "UserAttributes": [{ "Name": "email", "Value": email }],
        });
        self.call::<serde_json::Value>("SignUp", &body).await?;
        Ok(())
    }

    /// Verify the emailed confirmation code for a pending sign-up.
    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "ConfirmationCode": code,
        });
        self.call::<serde_json::Value>("ConfirmSignUp", &body).await?;
        Ok(())
    }

    /// Exchange email and password for the session token bundle.
    pub async fn password_auth(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": { "USERNAME": email, "PASSWORD": password },
        });
        let response: InitiateAuthResponse = self.call("InitiateAuth", &body).await?;
        Ok(response.authentication_result.unwrap_or_default())
    }

    /// Exchange a refresh token for fresh access and identity tokens.
    pub async fn refresh_auth(
        &self,
        refresh_token: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": { "REFRESH_TOKEN": refresh_token },
        });
        let response: InitiateAuthResponse = self.call("InitiateAuth", &body).await?;
        Ok(response.authentication_result.unwrap_or_default())
    }

    /// Start a password reset; the provider emails a confirmation code.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
        });
        self.call::<serde_json::Value>("ForgotPassword", &body).await?;
        Ok(())
    }

    /// Complete a password reset with the emailed code.
    pub async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": email,
            "ConfirmationCode": code,
            "Password": new_password,
        });
        self.call::<serde_json::Value>("ConfirmForgotPassword", &body).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &serde_json::Value,
    ) -> Result<T, ProviderError> {
        debug!(operation, "calling identity provider");

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(ProviderError::Service(Self::service_message(status, &text)))
    }

    /// Fold a non-2xx provider body into `"{errorType}: {message}"`, falling
    /// back to the HTTP status when neither field is present.
    fn service_message(status: StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ProviderErrorBody>(body) {
            let short_type = parsed.error_type.as_deref().map(Self::short_error_type);
            match (short_type, parsed.message) {
                (Some(error_type), Some(message)) => {
                    return format!("{}: {}", error_type, message)
                }
                (Some(error_type), None) => return error_type.to_string(),
                (None, Some(message)) => return message,
                (None, None) => {}
            }
        }
        format!("provider returned status {}", status)
    }

    /// Strip the namespace prefix from a wire error type,
    /// e.g. `"com.amazonaws.cognito#NotAuthorizedException"`.
    fn short_error_type(error_type: &str) -> &str {
        error_type.rsplit('#').next().unwrap_or(error_type)
    }
}
