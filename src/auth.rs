//! Access tokens for Google APIs.
//!
//! Firestore and FCM HTTP v1 both take an OAuth2 bearer token. Tokens handed
//! out by the metadata server live for about an hour, so
//! `AccessTokenSource::Metadata` caches the current token and fetches a new
//! one shortly before it expires.

use crate::config::{AuthConfig, AuthKind};
use crate::error::AuthError;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Fetches tokens for the instance's service account from the metadata server.
pub struct MetadataTokenSource {
    client: reqwest::Client,
    url: String,
    refresh_margin: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(url: String, timeout: Duration, refresh_margin: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            refresh_margin,
            cached: Mutex::new(None),
        })
    }

    /// Returns the cached token, refreshing it first if it is close to expiry.
    pub async fn token(&self) -> Result<String, AuthError> {
        // Held across the refresh so concurrent callers wait for one request.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + self.refresh_margin < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<CachedToken, AuthError> {
        let res = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token = res
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        debug!(expires_in = token.expires_in, "Fetched access token");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

/// Supplies the bearer token attached to outgoing API requests.
pub enum AccessTokenSource {
    Anonymous,
    Static(String),
    Metadata(MetadataTokenSource),
}

impl AccessTokenSource {
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Ok(match config.kind {
            AuthKind::None => Self::Anonymous,
            AuthKind::Static => Self::Static(config.access_token.clone().unwrap_or_default()),
            AuthKind::Metadata => Self::Metadata(MetadataTokenSource::new(
                config.metadata_url.clone(),
                Duration::from_millis(config.timeout_ms),
                Duration::from_secs(config.refresh_margin_seconds),
            )?),
        })
    }

    /// The token to send, or `None` when requests go out unauthenticated.
    pub async fn token(&self) -> Result<Option<String>, AuthError> {
        match self {
            Self::Anonymous => Ok(None),
            Self::Static(token) => Ok(Some(token.clone())),
            Self::Metadata(source) => source.token().await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

    fn metadata_source(server: &MockServer) -> AccessTokenSource {
        AccessTokenSource::from_config(&AuthConfig {
            kind: AuthKind::Metadata,
            access_token: None,
            metadata_url: format!("{}{}", server.uri(), TOKEN_PATH),
            refresh_margin_seconds: 60,
            timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_metadata_token_is_cached_until_near_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(header("metadata-flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.first",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = metadata_source(&server);
        assert_eq!(source.token().await.unwrap().as_deref(), Some("ya29.first"));
        assert_eq!(source.token().await.unwrap().as_deref(), Some("ya29.first"));
    }

    #[tokio::test]
    async fn test_metadata_token_inside_margin_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.short",
                "expires_in": 30,
                "token_type": "Bearer"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let source = metadata_source(&server);
        source.token().await.unwrap();
        source.token().await.unwrap();
    }

    #[tokio::test]
    async fn test_metadata_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string("no service account"))
            .mount(&server)
            .await;

        let err = metadata_source(&server).token().await.unwrap_err();
        assert!(matches!(err, AuthError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_static_and_anonymous_sources() {
        let source = AccessTokenSource::Static("ya29.fixed".to_string());
        assert_eq!(source.token().await.unwrap().as_deref(), Some("ya29.fixed"));
        assert_eq!(AccessTokenSource::Anonymous.token().await.unwrap(), None);
    }
}
