// ABOUTME: Error types for transport, storage and configuration in the orchestration layer
// ABOUTME: Re-exports the user-facing taxonomy from lightread-core alongside them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use thiserror::Error;

pub use crate::session::store::StoreError;
pub use lightread_core::errors::{
    ClaimsError, ErrorKind, RateLimitScope, RefreshFailure, SummarizeError, ValidationFailure,
};

/// Failure to get any HTTP status back from the remote API.
///
/// Non-2xx statuses are not errors at this level: they come back as an
/// [`ApiReply`](crate::api::ApiReply) and are classified by the pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request or connect timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, TLS error and the like
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be read
    #[error("failed to read response body: {0}")]
    Decode(String),

    /// Base URL and path did not form a valid URL
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() || error.is_body() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<ApiError> for SummarizeError {
    fn from(error: ApiError) -> Self {
        Self::network(error.to_string())
    }
}

impl From<ApiError> for RefreshFailure {
    fn from(error: ApiError) -> Self {
        Self::Network {
            details: error.to_string(),
        }
    }
}
