//! API client for the Phantom backend.
//!
//! `ApiClient` performs JSON requests against the backend, attaching the
//! session's bearer token and transparently retrying exactly once after a
//! token refresh when a call comes back 401. That refresh-then-retry path
//! is the only retry in this crate; failures below the HTTP layer surface
//! immediately as `NetworkError`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::SessionController;
use crate::config::Config;
use crate::models::{
    AchievementsResponse, CreateGhostRequest, DashboardSummary, Ghost, GhostListResponse,
    MarketCandlesResponse, MarketQuoteResponse, StreaksResponse, TickerValidationResponse,
    UpdateGhostRequest, UpdateUserRequest, UserProfile,
};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default page size for ghost listings.
const DEFAULT_GHOST_LIMIT: u32 = 50;

/// Authenticated client for the Phantom backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionController,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionController) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Perform one backend request.
    ///
    /// A 401 on the first attempt triggers a token refresh and a single
    /// marked retry; a 401 on the retry, a failed refresh, or a 401 on an
    /// unauthenticated call all force a sign-out (observed out-of-band via
    /// the session's watch channel) and surface as `Unauthorized`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        requires_auth: bool,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|_| ApiError::InvalidUrl)?;

        let mut is_retry = false;
        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if requires_auth {
                let token = self.session.access_token().ok_or(ApiError::Unauthorized)?;
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                let text = response.text().await?;
                return Ok(serde_json::from_str(&text)?);
            }

            if status == StatusCode::UNAUTHORIZED {
                if !is_retry && requires_auth && self.session.refresh_tokens().await.is_ok() {
                    debug!(endpoint, "retrying once after token refresh");
                    is_retry = true;
                    continue;
                }
                // Fail closed: an unrecoverable 401 ends the session.
                warn!(endpoint, "unauthorized, signing out");
                self.session.sign_out();
                return Err(ApiError::Unauthorized);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, None::<&()>, true).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, endpoint, Some(body), true).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, endpoint, Some(body), true).await
    }

    // ===== Ghost Endpoints =====

    pub async fn create_ghost(&self, request: &CreateGhostRequest) -> Result<Ghost, ApiError> {
        self.post("/v1/ghosts", request).await
    }

    pub async fn list_ghosts(&self, limit: Option<u32>) -> Result<GhostListResponse, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_GHOST_LIMIT);
        self.get(&format!("/v1/ghosts?limit={}", limit)).await
    }

    pub async fn get_ghost(&self, ghost_id: &str) -> Result<Ghost, ApiError> {
        self.get(&format!("/v1/ghosts/{}", ghost_id)).await
    }

    pub async fn update_ghost(
        &self,
        ghost_id: &str,
        request: &UpdateGhostRequest,
    ) -> Result<Ghost, ApiError> {
        self.patch(&format!("/v1/ghosts/{}", ghost_id), request).await
    }

    // ===== User Endpoints =====

    pub async fn get_user_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/v1/me").await
    }

    pub async fn update_user_profile(
        &self,
        request: &UpdateUserRequest,
    ) -> Result<UserProfile, ApiError> {
        self.patch("/v1/me", request).await
    }

    // ===== Dashboard Endpoints =====

    pub async fn get_dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.get("/v1/dashboard/summary").await
    }

    pub async fn get_achievements(&self) -> Result<AchievementsResponse, ApiError> {
        self.get("/v1/achievements").await
    }

    pub async fn get_streaks(&self) -> Result<StreaksResponse, ApiError> {
        self.get("/v1/streaks").await
    }

    // ===== Market Data Endpoints =====

    pub async fn validate_ticker(
        &self,
        symbol: &str,
    ) -> Result<TickerValidationResponse, ApiError> {
        self.get(&format!("/v1/market/validate?symbol={}", symbol)).await
    }

    pub async fn get_market_quote(&self, symbol: &str) -> Result<MarketQuoteResponse, ApiError> {
        self.get(&format!("/v1/market/quote?symbol={}", symbol)).await
    }

    pub async fn get_market_candles(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<MarketCandlesResponse, ApiError> {
        self.get(&format!(
            "/v1/market/candles?symbol={}&interval={}&range={}",
            symbol, interval, range
        ))
        .await
    }

    // ===== Health Check =====

    /// Unauthenticated; never reads the credential store.
    pub async fn health_check(&self) -> Result<HashMap<String, String>, ApiError> {
        self.request(Method::GET, "/v1/health", None::<&()>, false).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::credentials::{CredentialStore, MemoryStore, TokenKey};
    use crate::auth::{AuthState, IdentityProvider};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Payload {"sub":"user-123"} base64url-encoded without padding.
    const ID_TOKEN: &str = "header.eyJzdWIiOiJ1c2VyLTEyMyJ9.sig";

    fn signed_in_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.save(TokenKey::Access, "access-1").unwrap();
        store.save(TokenKey::Id, ID_TOKEN).unwrap();
        store.save(TokenKey::Refresh, "refresh-1").unwrap();
        store
    }

    fn client_for(
        api_server: &MockServer,
        provider_server: &MockServer,
        store: Arc<MemoryStore>,
    ) -> (ApiClient, SessionController) {
        let config = Config {
            client_id: "test-client-id".to_string(),
            api_base_url: api_server.uri(),
            provider_endpoint_override: Some(provider_server.uri()),
            ..Config::default()
        };
        let provider = IdentityProvider::new(&config).unwrap();
        let session = SessionController::new(provider, store);
        let client = ApiClient::new(&config, session.clone()).unwrap();
        (client, session)
    }

    fn profile_body() -> serde_json::Value {
        serde_json::json!({
            "userId": "user-123",
            "createdAt": "2026-01-30T12:00:00Z",
            "plan": "FREE"
        })
    }

    #[tokio::test]
    async fn refresh_then_retry_is_invisible_on_success() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        // First attempt is rejected, the marked retry succeeds.
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&api)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("authorization", "Bearer access-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .mount(&api)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "AuthFlow": "REFRESH_TOKEN_AUTH"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AuthenticationResult": {
                    "AccessToken": "access-2",
                    "IdToken": ID_TOKEN
                }
            })))
            .mount(&provider)
            .await;

        let store = signed_in_store();
        let (client, session) = client_for(&api, &provider, store.clone());

        let profile = client.get_user_profile().await.unwrap();
        assert_eq!(profile.user_id, "user-123");
        assert!(session.state().is_signed_in());
        assert_eq!(store.read(TokenKey::Access).unwrap().as_deref(), Some("access-2"));
    }

    #[tokio::test]
    async fn failed_refresh_forces_sign_out() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&api)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "__type": "NotAuthorizedException",
                "message": "Refresh Token has expired"
            })))
            .mount(&provider)
            .await;

        let (client, session) = client_for(&api, &provider, signed_in_store());

        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn second_401_after_refresh_does_not_loop() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        // Both the original attempt and the retry come back 401.
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&api)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AuthenticationResult": {
                    "AccessToken": "access-2",
                    "IdToken": ID_TOKEN
                }
            })))
            .mount(&provider)
            .await;

        let (client, session) = client_for(&api, &provider, signed_in_store());

        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_network_call() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&api)
            .await;

        let (client, _) = client_for(&api, &provider, Arc::new(MemoryStore::new()));

        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn health_check_needs_no_stored_token() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "ok" })),
            )
            .mount(&api)
            .await;

        let (client, _) = client_for(&api, &provider, Arc::new(MemoryStore::new()));

        let health = client.health_check().await.unwrap();
        assert_eq!(health.get("status").map(String::as_str), Some("ok"));

        // The unauthenticated call must not have attached a bearer token.
        let requests = api.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn unauthenticated_401_still_forces_sign_out() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&api)
            .await;

        let store = signed_in_store();
        let (client, session) = client_for(&api, &provider, store);
        assert!(session.state().is_signed_in());

        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn status_mapping_reaches_the_caller() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/ghosts/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&api)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/dashboard/summary"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&api)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/ghosts"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "ticker is required"
            })))
            .mount(&api)
            .await;

        let (client, _) = client_for(&api, &provider, signed_in_store());

        assert!(matches!(
            client.get_ghost("missing").await.unwrap_err(),
            ApiError::NotFound
        ));
        assert!(matches!(
            client.get_dashboard_summary().await.unwrap_err(),
            ApiError::ServerError(ref m) if m == "server error: 500"
        ));
        let create = CreateGhostRequest {
            ticker: String::new(),
            direction: "LONG".to_string(),
            intended_price: 0.0,
            intended_size: 0.0,
            hesitation_tags: None,
            note_text: None,
            voice_key: None,
        };
        assert!(matches!(
            client.create_ghost(&create).await.unwrap_err(),
            ApiError::ServerError(ref m) if m == "ticker is required"
        ));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decoding_error() {
        let api = MockServer::start().await;
        let provider = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&api)
            .await;

        let (client, session) = client_for(&api, &provider, signed_in_store());

        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::DecodingError(_)));
        // Decode failures are not auth failures; the session survives.
        assert!(session.state().is_signed_in());
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let provider = MockServer::start().await;
        // Grab a port that is closed by the time the request goes out.
        let unreachable = {
            let server = MockServer::start().await;
            server.uri()
        };

        let config = Config {
            client_id: "test-client-id".to_string(),
            api_base_url: unreachable,
            provider_endpoint_override: Some(provider.uri()),
            ..Config::default()
        };
        let session = SessionController::new(
            IdentityProvider::new(&config).unwrap(),
            signed_in_store(),
        );
        let client = ApiClient::new(&config, session).unwrap();

        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
    }
}
