//! Authenticated upstream HTTP client
//!
//! One logical call is one HTTP attempt: no retries here, callers
//! decide whether a failure is worth repeating.

use serde::de::DeserializeOwned;

use crate::auth::TokenManager;
use crate::error::ApiError;

pub struct UpstreamClient {
    http: reqwest::Client,
    tokens: TokenManager,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, tokens: TokenManager) -> Self {
        Self { http, tokens }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// GET `url` with `Authorization: Bearer <token>` and parse the JSON
    /// body into `T`. The body is read as text first so parse failures
    /// can carry the raw payload.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let token = self.tokens.bearer_token().await?;

        tracing::debug!(url = %url, "issuing authenticated request");
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(url = %url, status = %status, "upstream call failed");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(url = %url, "upstream response is not the expected JSON shape");
            ApiError::Parse {
                url: url.to_string(),
                message: e.to_string(),
                body,
            }
        })
    }
}
