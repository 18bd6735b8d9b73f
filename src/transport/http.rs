//! `reqwest` implementation of [`Transport`].
//!
//! # Authentication
//!
//! SendPulse uses the OAuth 2.0 client credentials grant. The access token is
//! requested lazily on the first authenticated call and cached until it
//! expires. When the API rejects a cached token with `401 Unauthorized`, the
//! token is refreshed and the request is sent once more.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::traits::{ApiError, Result, Transport};
use crate::config::{AuthSettings, Settings};

const TOKEN_PATH: &str = "/oauth/access_token";
const KEYCHAIN_SERVICE: &str = "sendpulse";

/// Seconds before the reported expiry at which a cached token is refreshed.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 30;

/// Client credentials used to obtain access tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// API user ID (OAuth client ID).
    pub user_id: String,
    /// API secret (OAuth client secret).
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials from an API user ID and secret.
    pub fn new(user_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            secret: secret.into(),
        }
    }

    /// Resolves credentials from settings, falling back to the keychain profile.
    pub fn from_settings(auth: &AuthSettings) -> Result<Self> {
        if let (Some(user_id), Some(secret)) = (&auth.user_id, &auth.secret) {
            return Ok(Self::new(user_id.clone(), secret.clone()));
        }
        match &auth.keychain_profile {
            Some(profile) => Self::load_from_keychain(profile),
            None => Err(ApiError::Config(
                "no API credentials: set user_id and secret or a keychain profile".to_string(),
            )),
        }
    }

    /// Loads credentials from the system keychain.
    pub fn load_from_keychain(profile: &str) -> Result<Self> {
        let entry = keyring::Entry::new(KEYCHAIN_SERVICE, profile)
            .map_err(|e| ApiError::Config(format!("keyring error: {}", e)))?;

        let creds_json = entry
            .get_password()
            .map_err(|e| ApiError::Config(format!("no credentials found: {}", e)))?;

        serde_json::from_str(&creds_json)
            .map_err(|e| ApiError::Config(format!("invalid credentials: {}", e)))
    }

    /// Saves credentials to the system keychain.
    pub fn save_to_keychain(&self, profile: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYCHAIN_SERVICE, profile)
            .map_err(|e| ApiError::Config(format!("keyring error: {}", e)))?;

        let creds_json = serde_json::to_string(self)
            .map_err(|e| ApiError::Internal(format!("serialize error: {}", e)))?;

        entry
            .set_password(&creds_json)
            .map_err(|e| ApiError::Config(format!("keyring error: {}", e)))?;

        Ok(())
    }
}

/// OAuth token request body.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    expires_in: i64,
}

/// Cached access token.
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = Duration::try_seconds(response.expires_in)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                ApiError::Authentication(format!(
                    "token lifetime out of range: {}",
                    response.expires_in
                ))
            })?;

        Ok(Self {
            value: response.access_token,
            expires_at,
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// SendPulse API transport over HTTPS.
///
/// Safe to share between tasks; the only mutable state is the cached access
/// token.
pub struct HttpTransport {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Client credentials for the token endpoint.
    credentials: Credentials,
    /// Current access token (refreshed as needed).
    token: RwLock<Option<AccessToken>>,
}

impl HttpTransport {
    /// Creates a transport against the default API endpoint.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            credentials,
            token: RwLock::new(None),
        }
    }

    /// Creates a transport from settings (base URL, timeout, credentials).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let credentials = Credentials::from_settings(&settings.auth)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.api.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(format!("http client: {}", e)))?;

        Ok(Self::new(credentials)
            .with_base_url(&settings.api.base_url)
            .with_client(client))
    }

    /// Overrides the API base URL (useful for proxies and test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the cached token, requesting a new one when missing or expired.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.value.clone());
            }
        }
        self.refresh_access_token(None).await
    }

    /// Requests a new access token and caches it.
    ///
    /// A valid token cached by another task while this one waited for the
    /// lock is returned as is, unless it is the `rejected` one.
    async fn refresh_access_token(&self, rejected: Option<&str>) -> Result<String> {
        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if !token.is_expired(Utc::now()) && Some(token.value.as_str()) != rejected {
                return Ok(token.value.clone());
            }
        }

        let body = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.credentials.user_id,
            client_secret: &self.credentials.secret,
        };

        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Authentication(format!(
                "token request failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Authentication(format!("parse token response: {}", e)))?;

        let token = AccessToken::from_response(token_response, Utc::now())?;
        let value = token.value.clone();
        *slot = Some(token);

        tracing::info!(user_id = %self.credentials.user_id, "SendPulse access token refreshed");
        Ok(value)
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.client.request(method, url);
        if let Some(token) = token {
            builder = builder.headers(Self::auth_headers(token)?);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))
    }

    /// Handles API error responses.
    async fn handle_error(url: &str, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        error_for_status(status, url, body, retry_after_secs)
    }
}

/// Maps a non-2xx status to an [`ApiError`].
fn error_for_status(
    status: StatusCode,
    url: &str,
    body: String,
    retry_after_secs: Option<u64>,
) -> ApiError {
    match status.as_u16() {
        401 => ApiError::Authentication(format!("unauthorized: {}", body)),
        404 => ApiError::NotFound(body),
        429 => ApiError::RateLimited { retry_after_secs },
        code => ApiError::Http {
            status: code,
            url: url.to_string(),
            body,
        },
    }
}

/// Parses a response body; an empty body is `null`.
fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode(format!("parse response: {}", e)))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%method, path, "SendPulse API request");

        let token = if authenticated {
            Some(self.access_token().await?)
        } else {
            None
        };

        let mut response = self
            .send(method.clone(), &url, body.as_ref(), token.as_deref())
            .await?;

        if authenticated && response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "access token rejected, refreshing and retrying once");
            let token = self.refresh_access_token(token.as_deref()).await?;
            response = self.send(method, &url, body.as_ref(), Some(&token)).await?;
        }

        if !response.status().is_success() {
            return Err(Self::handle_error(&url, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        parse_body(&text)
    }
}
