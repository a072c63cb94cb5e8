// ABOUTME: User-facing error taxonomy for summarize, regenerate and save requests
// ABOUTME: Every terminal error converts to a short message for the page surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::RefreshFailure;
use crate::constants::text_limits::{MAX_TEXT_CHARS, MIN_TEXT_CHARS};

/// Stable classification of pipeline errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input size or emptiness
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Local or server-side rate limit
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimit,
    /// Missing, expired or unrefreshable session
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    /// Feature reserved to pro accounts
    #[serde(rename = "PRO_FEATURE_ERROR")]
    ProFeature,
    /// Transport failure or timeout
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// Server answered 5xx
    #[serde(rename = "SERVER_ERROR")]
    Server,
    /// Any other 4xx
    #[serde(rename = "REQUEST_ERROR")]
    Request,
}

impl ErrorKind {
    /// Wire code for this kind
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::RateLimit => "RATE_LIMIT_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::ProFeature => "PRO_FEATURE_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Request => "REQUEST_ERROR",
        }
    }

    /// What the user can do about it
    #[must_use]
    pub const fn recovery_hint(self) -> &'static str {
        match self {
            Self::Validation => "Adjust the selected text and try again",
            Self::RateLimit | Self::Network | Self::Server => "Wait a moment and try again",
            Self::Auth => "Log in again",
            Self::ProFeature => "Upgrade to pro",
            Self::Request => "Contact support if the problem persists",
        }
    }

    /// Whether waiting and retrying can succeed without any user change
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Server)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a selection was rejected before any request was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Nothing left after trimming
    #[error("Selected text is empty. Please select some text to summarize.")]
    Empty,
    /// Fewer than the minimum number of characters
    #[error("Selected text is too short ({length} characters). Please select at least {min} characters.")]
    TooShort {
        /// Characters in the trimmed selection
        length: usize,
        /// Required minimum
        min: usize,
    },
    /// More than the maximum number of characters
    #[error("Selected text is too long ({length} characters). Please select at most {max} characters.")]
    TooLong {
        /// Characters in the trimmed selection
        length: usize,
        /// Allowed maximum
        max: usize,
    },
}

impl ValidationFailure {
    /// Check a selection against the text bounds, returning the trimmed text
    ///
    /// # Errors
    ///
    /// Returns the first bound the trimmed text violates
    pub fn check(text: &str) -> Result<&str, Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Self::Empty);
        }
        let length = trimmed.chars().count();
        if length < MIN_TEXT_CHARS {
            return Err(Self::TooShort {
                length,
                min: MIN_TEXT_CHARS,
            });
        }
        if length > MAX_TEXT_CHARS {
            return Err(Self::TooLong {
                length,
                max: MAX_TEXT_CHARS,
            });
        }
        Ok(trimmed)
    }
}

/// Who enforced a rate limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitScope {
    /// The in-process limiter rejected the action before any I/O
    Local {
        /// Action key that was rejected
        action: String,
    },
    /// The server answered 429
    Server,
}

/// Terminal error states of a pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    /// Selection failed validation
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// Local limiter or server 429
    #[error("rate limited ({scope:?}): {message}")]
    RateLimited {
        /// Where the limit was enforced
        scope: RateLimitScope,
        /// Message shown to the user
        message: String,
    },
    /// Session missing, expired, or refresh failed
    #[error("authentication failed: {reason}")]
    Auth {
        /// Message shown to the user
        reason: String,
    },
    /// Pro-only feature used from a non-pro account
    #[error("pro feature required: {message}")]
    ProFeature {
        /// Message shown to the user
        message: String,
    },
    /// Transport failure or timeout
    #[error("network error: {details}")]
    Network {
        /// Transport error description, never shown verbatim
        details: String,
    },
    /// Server answered 5xx
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server-provided or generic message
        message: String,
    },
    /// Server answered another 4xx
    #[error("request error {status}: {message}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Server-provided or generic message
        message: String,
    },
}

const LOGIN_REQUIRED: &str = "Please login to use LightRead";
const SESSION_EXPIRED: &str = "Session expired. Please login again.";
const PRO_FEATURE_MESSAGE: &str =
    "Summary regeneration is only available for pro users. Please upgrade to pro to use this feature.";
const LOCAL_RATE_LIMIT_MESSAGE: &str =
    "Too many requests. Please wait a moment before trying again.";
const NETWORK_MESSAGE: &str =
    "Unable to reach the LightRead server. Please check your connection and try again.";

impl SummarizeError {
    /// Local limiter rejection for an action key, telling the user how long
    /// to wait when the limiter knows
    #[must_use]
    pub fn local_rate_limit(action: impl Into<String>, retry_after: Duration) -> Self {
        let wait_secs = retry_after.as_millis().div_ceil(1000);
        let message = if wait_secs == 0 {
            LOCAL_RATE_LIMIT_MESSAGE.to_owned()
        } else {
            let unit = if wait_secs == 1 { "second" } else { "seconds" };
            format!("Too many requests. Please wait {wait_secs} {unit} before trying again.")
        };
        Self::RateLimited {
            scope: RateLimitScope::Local {
                action: action.into(),
            },
            message,
        }
    }

    /// Server-side 429, keeping the server's message when it sent one
    #[must_use]
    pub fn server_rate_limit(message: Option<String>) -> Self {
        Self::RateLimited {
            scope: RateLimitScope::Server,
            message: message
                .unwrap_or_else(|| "Daily summary limit reached. Please try again later.".to_owned()),
        }
    }

    /// No session at all
    #[must_use]
    pub fn login_required() -> Self {
        Self::Auth {
            reason: LOGIN_REQUIRED.to_owned(),
        }
    }

    /// Session existed but could not be kept alive
    #[must_use]
    pub fn session_expired() -> Self {
        Self::Auth {
            reason: SESSION_EXPIRED.to_owned(),
        }
    }

    /// Pro-only feature, with the canonical upgrade message
    #[must_use]
    pub fn pro_feature() -> Self {
        Self::ProFeature {
            message: PRO_FEATURE_MESSAGE.to_owned(),
        }
    }

    /// Transport failure
    #[must_use]
    pub fn network(details: impl Into<String>) -> Self {
        Self::Network {
            details: details.into(),
        }
    }

    /// Classification of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::ProFeature { .. } => ErrorKind::ProFeature,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Request { .. } => ErrorKind::Request,
        }
    }

    /// Short human-readable message for the page surface.
    ///
    /// Never includes transport details or error chains.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(failure) => failure.to_string(),
            Self::RateLimited { message, .. }
            | Self::ProFeature { message }
            | Self::Server { message, .. }
            | Self::Request { message, .. } => message.clone(),
            Self::Auth { reason } => reason.clone(),
            Self::Network { .. } => NETWORK_MESSAGE.to_owned(),
        }
    }
}

impl From<RefreshFailure> for SummarizeError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::NoSession => Self::login_required(),
            RefreshFailure::Unsupported
            | RefreshFailure::Rejected { .. }
            | RefreshFailure::Network { .. }
            | RefreshFailure::InvalidResponse { .. } => Self::session_expired(),
        }
    }
}
