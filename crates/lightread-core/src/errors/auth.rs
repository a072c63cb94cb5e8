// ABOUTME: Errors raised while decoding token claims or refreshing a session token
// ABOUTME: RefreshFailure is Clone so one refresh outcome can be handed to every waiter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use thiserror::Error;

/// Reasons a token payload could not be turned into claims.
///
/// Callers treat every variant as "expired": a token we cannot read is a
/// token we must refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// Token does not have the three dot-separated segments
    #[error("token has {segments} segments, expected 3")]
    Malformed {
        /// Number of segments found
        segments: usize,
    },
    /// Payload segment is not valid base64url
    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),
    /// Payload decoded but is not a claims object
    #[error("token payload is not a valid claims object: {0}")]
    Payload(String),
}

/// Outcome of a refresh attempt that did not produce a new token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// Nothing to refresh: no token is stored
    #[error("no session token available")]
    NoSession,
    /// Refresh endpoint does not exist in this environment (HTTP 404)
    #[error("token refresh is not supported by the server")]
    Unsupported,
    /// Server answered with a non-success status
    #[error("token refresh rejected with status {status}")]
    Rejected {
        /// HTTP status code returned by the refresh endpoint
        status: u16,
    },
    /// Transport failure or timeout
    #[error("token refresh failed: {details}")]
    Network {
        /// Transport error description
        details: String,
    },
    /// Success status but the body carried no usable token
    #[error("token refresh returned an invalid response: {details}")]
    InvalidResponse {
        /// Decode error description
        details: String,
    },
}
