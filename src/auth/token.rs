//! Bearer token acquisition and caching
//!
//! The provider issues a JWT from `GET login` under HTTP Basic auth.
//! We cache it under a well-known key with a TTL shorter than the
//! token's real lifetime, so a cache hit is always presentable and an
//! expired or evicted entry triggers a transparent re-login.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ApiCache, CacheOptions};
use crate::constants::TOKEN_CACHE_KEY;
use crate::error::ApiError;
use crate::model::TokenResponse;

use super::credentials::CredentialSource;

pub struct TokenManager {
    http: reqwest::Client,
    cache: Arc<ApiCache>,
    credentials: CredentialSource,
    login_url: String,
    token_ttl: Duration,
}

impl TokenManager {
    /// `api_url` is the provider base URL ending with a slash.
    pub fn new(
        api_url: &str,
        credentials: CredentialSource,
        cache: Arc<ApiCache>,
        token_ttl: Duration,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            cache,
            credentials,
            login_url: format!("{api_url}login"),
            token_ttl,
        }
    }

    /// Return a valid bearer token, re-fetching transparently when the
    /// cached one expired or was evicted. Each fresh fetch populates
    /// exactly one cache entry; failures are not retried.
    pub async fn bearer_token(&self) -> Result<String, ApiError> {
        self.cache
            .request(
                || self.fetch_token(),
                CacheOptions::new(TOKEN_CACHE_KEY, self.token_ttl),
            )
            .await
    }

    /// Drop the cached token so the next call logs in again.
    pub fn invalidate(&self) {
        self.cache.delete(TOKEN_CACHE_KEY);
    }

    async fn fetch_token(&self) -> Result<String, ApiError> {
        let credentials = self.credentials.resolve()?;
        tracing::debug!(username = %credentials.username, "fetching fresh authentication token");

        let response = self
            .http
            .get(&self.login_url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| ApiError::Authentication(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "token fetch failed");
            return Err(ApiError::Authentication(format!(
                "login returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Authentication(format!("malformed login response: {e}")))?;

        tracing::debug!("token fetched successfully");
        Ok(payload.token)
    }
}
