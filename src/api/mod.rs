// ABOUTME: Remote summarization API: reply type, client trait and HTTP implementation
// ABOUTME: Calls return the raw status and JSON body so the pipeline can classify them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// `reqwest`-backed client
pub mod client;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ApiError;
use crate::models::{LoginRequest, SaveSummaryRequest, SummaryRequest};

pub use client::HttpApiClient;

/// Status and parsed body of an HTTP response.
///
/// A body that is not JSON is kept as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body
    pub body: Value,
}

impl ApiReply {
    /// Reply with the given status and body
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Deserialize the body
    ///
    /// # Errors
    ///
    /// Returns the serde error if the body does not match `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    /// Server-provided `error` message, if any
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .or_else(|| self.body.get("message"))
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .map(str::to_owned)
    }

    /// Machine-readable `code`, if any
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

/// Endpoints of the summarization API used by the background core.
///
/// Every call returns `Ok` as soon as an HTTP status came back; `Err` means
/// the request never completed.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// `POST /auth/refresh` with the old token as bearer
    async fn refresh_token(&self, token: &str) -> Result<ApiReply, ApiError>;

    /// `POST /auth/login`
    async fn login(&self, credentials: &LoginRequest) -> Result<ApiReply, ApiError>;

    /// `POST /summarize`
    async fn summarize(&self, token: &str, request: &SummaryRequest) -> Result<ApiReply, ApiError>;

    /// `GET /user/settings`
    async fn user_settings(&self, token: &str) -> Result<ApiReply, ApiError>;

    /// `GET /user/limits`
    async fn user_limits(&self, token: &str) -> Result<ApiReply, ApiError>;

    /// `POST /summaries/save`
    async fn save_summary(
        &self,
        token: &str,
        request: &SaveSummaryRequest,
    ) -> Result<ApiReply, ApiError>;

    /// `POST /rpc/get_enum_values`
    async fn enum_values(&self, token: &str) -> Result<ApiReply, ApiError>;
}
