//! OAuth access tokens for the Google APIs
//!
//! The daemon never runs an interactive consent flow. It reads a previously
//! authorized `authorized_user` token file and trades its refresh token for
//! short-lived access tokens, cached until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::path::Path;
use tokio::sync::Mutex;

use rotation_core::ProviderError;

/// Google OAuth token exchange endpoint
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

const AUTHORIZED_USER: &str = "authorized_user";
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Source of bearer tokens for provider requests
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently valid access token
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// Contents of an `authorized_user` token file
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl AuthorizedUserFile {
    /// Parse token file text
    pub fn parse(text: &str) -> Result<Self, ProviderError> {
        let file: Self = serde_json::from_str(text)
            .map_err(|e| ProviderError::Auth(format!("invalid token file: {e}")))?;
        if file.kind != AUTHORIZED_USER {
            return Err(ProviderError::Auth(format!(
                "token file has type '{}', expected '{AUTHORIZED_USER}'",
                file.kind
            )));
        }
        Ok(file)
    }

    /// Read and parse a token file
    pub async fn load(path: &Path) -> Result<Self, ProviderError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProviderError::Auth(format!("cannot read token file {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }
}

impl std::fmt::Debug for AuthorizedUserFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserFile")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

struct CachedToken {
    value: String,
    refresh_after: DateTime<Utc>,
}

/// Refresh-token based [`TokenSource`]
pub struct AuthorizedUserToken {
    http: reqwest::Client,
    credentials: AuthorizedUserFile,
    endpoint: String,
    cached: Mutex<Option<CachedToken>>,
}

impl AuthorizedUserToken {
    /// Create token source exchanging at [`TOKEN_ENDPOINT`]
    pub fn new(http: reqwest::Client, credentials: AuthorizedUserFile) -> Self {
        Self {
            http,
            credentials,
            endpoint: TOKEN_ENDPOINT.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Load credentials from `path`
    pub async fn from_file(http: reqwest::Client, path: &Path) -> Result<Self, ProviderError> {
        Ok(Self::new(http, AuthorizedUserFile::load(path).await?))
    }

    async fn refresh(&self) -> Result<CachedToken, ProviderError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ];
        let response = self
            .http
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("token refresh failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Auth(format!("token refresh failed: {e}")))?;
        if !status.is_success() {
            return Err(ProviderError::Auth(format!(
                "token refresh rejected with status {}: {body}",
                status.as_u16()
            )));
        }

        let token = decode_token(&body, Utc::now())?;
        tracing::debug!(refresh_after = %token.refresh_after, "refreshed access token");
        Ok(token)
    }
}

#[async_trait::async_trait]
impl TokenSource for AuthorizedUserToken {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }
        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

impl std::fmt::Debug for AuthorizedUserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserToken")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Token response body; usable until a minute before it expires
fn decode_token(body: &str, now: DateTime<Utc>) -> Result<CachedToken, ProviderError> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Auth(format!("invalid token response: {e}")))?;
    let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
    Ok(CachedToken {
        value: response.access_token,
        refresh_after: now + Duration::seconds(lifetime) - Duration::minutes(1),
    })
}
