use crate::domain::models::OAuthToken;
use crate::infrastructure::config::OAuthSettings;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::AppError;
use crate::infrastructure::oauth_client::{CodeExchangeRequest, OAuthHttpClient, RefreshRequest, TokenResponse};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const TOKEN_LEEWAY_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub token_endpoint: String,
    pub authorization_endpoint: String,
}

impl OAuthConfig {
    pub fn from_settings(settings: &OAuthSettings) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureTokenResult {
    Existing(OAuthToken),
    Refreshed(OAuthToken),
    ReauthenticationRequired,
}

/// Credential presence probe for the dashboard.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TokenStatus {
    pub token_stored: bool,
    pub token_valid: bool,
}

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Token lifecycle: load the stored credential, use it while valid, refresh
/// it through the token endpoint when expired, and require a fresh consent
/// flow when neither works. No automatic retries.
pub struct OAuthManager<S, C>
where
    S: CredentialStore,
    C: OAuthHttpClient,
{
    config: OAuthConfig,
    credential_store: Arc<S>,
    oauth_client: Arc<C>,
    now_provider: NowProvider,
}

impl<S, C> OAuthManager<S, C>
where
    S: CredentialStore,
    C: OAuthHttpClient,
{
    pub fn new(config: OAuthConfig, credential_store: Arc<S>, oauth_client: Arc<C>) -> Self {
        Self {
            config,
            credential_store,
            oauth_client,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn token_status(&self) -> Result<TokenStatus, AppError> {
        let stored = self.credential_store.load_token()?;
        let now = (self.now_provider)();
        Ok(TokenStatus {
            token_stored: stored.is_some(),
            token_valid: stored
                .map(|token| token.is_valid_at(now, TOKEN_LEEWAY_SECONDS))
                .unwrap_or(false),
        })
    }

    /// Consent URL for the manual re-authentication path.
    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        if state.trim().is_empty() {
            return Err(AppError::Authentication("state must not be empty".to_string()));
        }
        if self.config.scopes.is_empty() {
            return Err(AppError::Authentication(
                "at least one scope is required".to_string(),
            ));
        }

        let mut url = Url::parse(&self.config.authorization_endpoint).map_err(|error| {
            AppError::Authentication(format!("invalid authorization endpoint: {error}"))
        })?;
        let scope = self.config.scopes.join(" ");

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &scope)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code and persist the resulting token.
    pub async fn authenticate_with_code(
        &self,
        authorization_code: &str,
    ) -> Result<OAuthToken, AppError> {
        if authorization_code.trim().is_empty() {
            return Err(AppError::Authentication(
                "authorization code must not be empty".to_string(),
            ));
        }

        let response = self
            .oauth_client
            .exchange_authorization_code(CodeExchangeRequest {
                token_endpoint: self.config.token_endpoint.clone(),
                client_id: self.config.client_id.clone(),
                client_secret: self.config.client_secret.clone(),
                redirect_uri: self.config.redirect_uri.clone(),
                authorization_code: authorization_code.to_string(),
            })
            .await?;

        let token = self.token_from_response(response, None);
        self.credential_store.save_token(&token)?;
        Ok(token)
    }

    pub async fn ensure_access_token(&self) -> Result<EnsureTokenResult, AppError> {
        let Some(stored_token) = self.credential_store.load_token()? else {
            return Ok(EnsureTokenResult::ReauthenticationRequired);
        };

        if stored_token.is_valid_at((self.now_provider)(), TOKEN_LEEWAY_SECONDS) {
            return Ok(EnsureTokenResult::Existing(stored_token));
        }

        let Some(refresh_token) = stored_token.refresh_token.clone() else {
            return Ok(EnsureTokenResult::ReauthenticationRequired);
        };

        let refreshed = self
            .oauth_client
            .refresh_access_token(RefreshRequest {
                token_endpoint: self.config.token_endpoint.clone(),
                client_id: self.config.client_id.clone(),
                client_secret: self.config.client_secret.clone(),
                refresh_token,
            })
            .await;

        match refreshed {
            Ok(response) => {
                let token = self.token_from_response(response, stored_token.refresh_token.clone());
                self.credential_store.save_token(&token)?;
                Ok(EnsureTokenResult::Refreshed(token))
            }
            Err(AppError::Authentication(reason)) => {
                log::warn!("token refresh rejected: {reason}");
                Ok(EnsureTokenResult::ReauthenticationRequired)
            }
            Err(error) => Err(error),
        }
    }

    /// The access token every calendar operation needs, or a hard
    /// authentication failure when no credential can be produced.
    pub async fn require_access_token(&self) -> Result<OAuthToken, AppError> {
        match self.ensure_access_token().await? {
            EnsureTokenResult::Existing(token) | EnsureTokenResult::Refreshed(token) => Ok(token),
            EnsureTokenResult::ReauthenticationRequired => Err(AppError::Authentication(
                "no valid Google credential; complete the authorization flow".to_string(),
            )),
        }
    }

    pub fn clear_stored_token(&self) -> Result<(), AppError> {
        self.credential_store.delete_token()
    }

    fn token_from_response(
        &self,
        response: TokenResponse,
        fallback_refresh_token: Option<String>,
    ) -> OAuthToken {
        let expires_at = (self.now_provider)() + Duration::seconds(response.expires_in.max(0));
        OAuthToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(fallback_refresh_token),
            expires_at,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scope: response.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::credential_store::InMemoryCredentialStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    enum FakeResponse {
        Success(TokenResponse),
        Rejected(String),
    }

    impl Default for FakeResponse {
        fn default() -> Self {
            Self::Success(TokenResponse {
                access_token: "fake_access".to_string(),
                refresh_token: Some("fake_refresh".to_string()),
                expires_in: 3600,
                token_type: Some("Bearer".to_string()),
                scope: Some(CALENDAR_SCOPE.to_string()),
            })
        }
    }

    #[derive(Debug, Default)]
    struct FakeOAuthHttpClient {
        exchange_response: Mutex<FakeResponse>,
        refresh_response: Mutex<FakeResponse>,
        exchange_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
    }

    impl FakeOAuthHttpClient {
        fn set_refresh_response(&self, response: FakeResponse) {
            *self.refresh_response.lock().expect("refresh mutex poisoned") = response;
        }
    }

    #[async_trait]
    impl OAuthHttpClient for FakeOAuthHttpClient {
        async fn exchange_authorization_code(
            &self,
            _request: CodeExchangeRequest,
        ) -> Result<TokenResponse, AppError> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            match self
                .exchange_response
                .lock()
                .expect("exchange mutex poisoned")
                .clone()
            {
                FakeResponse::Success(value) => Ok(value),
                FakeResponse::Rejected(message) => Err(AppError::Authentication(message)),
            }
        }

        async fn refresh_access_token(
            &self,
            _request: RefreshRequest,
        ) -> Result<TokenResponse, AppError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            match self
                .refresh_response
                .lock()
                .expect("refresh mutex poisoned")
                .clone()
            {
                FakeResponse::Success(value) => Ok(value),
                FakeResponse::Rejected(message) => Err(AppError::Authentication(message)),
            }
        }
    }

    fn test_config() -> OAuthConfig {
        OAuthConfig::from_settings(&OAuthSettings {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://127.0.0.1:8080/oauth2/callback".to_string(),
        })
    }

    fn valid_token() -> OAuthToken {
        OAuthToken {
            access_token: "stored-access".to_string(),
            refresh_token: Some("stored-refresh".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            token_type: "Bearer".to_string(),
            scope: Some(CALENDAR_SCOPE.to_string()),
        }
    }

    fn expired_token() -> OAuthToken {
        let mut token = valid_token();
        token.expires_at = Utc::now() - Duration::minutes(5);
        token
    }

    #[tokio::test]
    async fn valid_stored_token_is_used_without_refreshing() {
        let store = Arc::new(InMemoryCredentialStore::default());
        store.save_token(&valid_token()).expect("save token");
        let client = Arc::new(FakeOAuthHttpClient::default());
        let manager = OAuthManager::new(test_config(), Arc::clone(&store), Arc::clone(&client));

        let result = manager.ensure_access_token().await.expect("ensure token");
        assert!(matches!(result, EnsureTokenResult::Existing(_)));
        assert_eq!(client.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_with_refresh_token_is_refreshed_and_persisted() {
        let store = Arc::new(InMemoryCredentialStore::default());
        store.save_token(&expired_token()).expect("save token");
        let client = Arc::new(FakeOAuthHttpClient::default());
        client.set_refresh_response(FakeResponse::Success(TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
            scope: Some(CALENDAR_SCOPE.to_string()),
        }));
        let manager = OAuthManager::new(test_config(), Arc::clone(&store), Arc::clone(&client));

        match manager.ensure_access_token().await.expect("ensure token") {
            EnsureTokenResult::Refreshed(token) => {
                assert_eq!(token.access_token, "new-access");
                // The original refresh token survives when the endpoint
                // returns none.
                assert_eq!(token.refresh_token.as_deref(), Some("stored-refresh"));
            }
            other => panic!("expected refreshed result, got {other:?}"),
        }

        let persisted = store.load_token().expect("load").expect("token stored");
        assert_eq!(persisted.access_token, "new-access");
    }

    #[tokio::test]
    async fn rejected_refresh_requires_reauthentication() {
        let store = Arc::new(InMemoryCredentialStore::default());
        store.save_token(&expired_token()).expect("save token");
        let client = Arc::new(FakeOAuthHttpClient::default());
        client.set_refresh_response(FakeResponse::Rejected("invalid_grant".to_string()));
        let manager = OAuthManager::new(test_config(), store, Arc::clone(&client));

        let result = manager.ensure_access_token().await.expect("ensure token");
        assert_eq!(result, EnsureTokenResult::ReauthenticationRequired);
        assert_eq!(client.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_token_surfaces_as_authentication_failure() {
        let store = Arc::new(InMemoryCredentialStore::default());
        let client = Arc::new(FakeOAuthHttpClient::default());
        let manager = OAuthManager::new(test_config(), store, client);

        assert!(matches!(
            manager.require_access_token().await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_with_code_saves_the_exchanged_token() {
        let store = Arc::new(InMemoryCredentialStore::default());
        let client = Arc::new(FakeOAuthHttpClient::default());
        let manager = OAuthManager::new(test_config(), Arc::clone(&store), Arc::clone(&client));

        let token = manager
            .authenticate_with_code("sample-code")
            .await
            .expect("exchange code");
        assert_eq!(token.access_token, "fake_access");
        assert_eq!(client.exchange_calls.load(Ordering::SeqCst), 1);
        assert!(store.load_token().expect("load").is_some());
    }

    #[test]
    fn token_status_reports_presence_and_validity() {
        let store = Arc::new(InMemoryCredentialStore::default());
        let client = Arc::new(FakeOAuthHttpClient::default());
        let manager = OAuthManager::new(test_config(), Arc::clone(&store), client);

        let status = manager.token_status().expect("status");
        assert!(!status.token_stored && !status.token_valid);

        store.save_token(&expired_token()).expect("save token");
        let status = manager.token_status().expect("status");
        assert!(status.token_stored && !status.token_valid);

        store.save_token(&valid_token()).expect("save token");
        let status = manager.token_status().expect("status");
        assert!(status.token_stored && status.token_valid);
    }

    #[test]
    fn authorization_url_carries_offline_consent_parameters() {
        let store = Arc::new(InMemoryCredentialStore::default());
        let client = Arc::new(FakeOAuthHttpClient::default());
        let manager = OAuthManager::new(test_config(), store, client);

        let url = manager.authorization_url("state-1").expect("url");
        assert!(url.starts_with(DEFAULT_AUTHORIZATION_ENDPOINT));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=state-1"));

        assert!(matches!(
            manager.authorization_url("  "),
            Err(AppError::Authentication(_))
        ));
    }
}
