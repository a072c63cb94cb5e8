// ABOUTME: HTTP implementation of the summarization API on top of reqwest
// ABOUTME: Attaches bearer tokens, applies timeouts and keeps non-2xx replies as data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{ApiReply, SummaryApi};
use crate::config::ClientConfig;
use crate::constants::endpoints;
use crate::errors::ApiError;
use crate::models::{LoginRequest, SaveSummaryRequest, SummaryRequest};
use crate::utils::http_client::create_client_with_timeout;

/// Summarization API reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Client for `base_url` using an existing `reqwest::Client`
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Client with the configured server URL and timeouts
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            create_client_with_timeout(config.request_timeout, config.connect_timeout),
            &config.server_url,
        )
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<ApiReply, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "API request failed before a response arrived");
            ApiError::from(e)
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                debug!(path, status, error = %e, "Response body is not JSON");
                Value::Null
            })
        };

        debug!(path, status, "API response received");
        Ok(ApiReply::new(status, body))
    }
}

#[async_trait]
impl SummaryApi for HttpApiClient {
    async fn refresh_token(&self, token: &str) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::AUTH_REFRESH)?;
        let request = self.client.post(url).bearer_auth(token);
        self.execute(request, endpoints::AUTH_REFRESH).await
    }

    async fn login(&self, credentials: &LoginRequest) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::AUTH_LOGIN)?;
        let request = self.client.post(url).json(credentials);
        self.execute(request, endpoints::AUTH_LOGIN).await
    }

    async fn summarize(&self, token: &str, request: &SummaryRequest) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::SUMMARIZE)?;
        let request = self.client.post(url).bearer_auth(token).json(request);
        self.execute(request, endpoints::SUMMARIZE).await
    }

    async fn user_settings(&self, token: &str) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::USER_SETTINGS)?;
        let request = self.client.get(url).bearer_auth(token);
        self.execute(request, endpoints::USER_SETTINGS).await
    }

    async fn user_limits(&self, token: &str) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::USER_LIMITS)?;
        let request = self.client.get(url).bearer_auth(token);
        self.execute(request, endpoints::USER_LIMITS).await
    }

    async fn save_summary(
        &self,
        token: &str,
        request: &SaveSummaryRequest,
    ) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::SUMMARIES_SAVE)?;
        let request = self.client.post(url).bearer_auth(token).json(request);
        self.execute(request, endpoints::SUMMARIES_SAVE).await
    }

    async fn enum_values(&self, token: &str) -> Result<ApiReply, ApiError> {
        let url = self.url(endpoints::ENUM_VALUES)?;
        let request = self.client.post(url).bearer_auth(token);
        self.execute(request, endpoints::ENUM_VALUES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base() {
        let client = HttpApiClient::new(Client::new(), "https://api.lightread.test/v1/");
        assert_eq!(client.base_url(), "https://api.lightread.test/v1");
        assert_eq!(
            client.url("/summarize").unwrap().as_str(),
            "https://api.lightread.test/v1/summarize"
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        let client = HttpApiClient::new(Client::new(), "not a url");
        assert!(matches!(client.url("/summarize"), Err(ApiError::Url(_))));
    }
}
