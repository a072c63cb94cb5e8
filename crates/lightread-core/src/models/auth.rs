// ABOUTME: Session state, user reference, token claims and auth endpoint payloads
// ABOUTME: AuthState keeps is_logged_in consistent with the presence of token and user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ClaimsError;

/// Signed-in user as stored under the `user` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Account email
    pub email: String,
    /// Account identifier, when the server provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Any other fields the server attached to the user object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRef {
    /// User reference with only an email
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            id: None,
            extra: Map::new(),
        }
    }
}

/// In-memory session state of the background process.
///
/// `is_logged_in` is derived: it is true exactly when both a token and a
/// user are present. Values arriving from other contexts are normalized on
/// deserialization so the invariant cannot be broken from outside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AuthStateRepr", into = "AuthStateRepr")]
pub struct AuthState {
    token: Option<String>,
    user: Option<UserRef>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthStateRepr {
    #[serde(default)]
    is_logged_in: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserRef>,
}

impl From<AuthStateRepr> for AuthState {
    fn from(repr: AuthStateRepr) -> Self {
        // is_logged_in from the wire is advisory only
        Self::from_parts(repr.token, repr.user)
    }
}

impl From<AuthState> for AuthStateRepr {
    fn from(state: AuthState) -> Self {
        Self {
            is_logged_in: state.is_logged_in(),
            token: state.token,
            user: state.user,
        }
    }
}

impl AuthState {
    /// `{isLoggedIn: false, token: null, user: null}`
    #[must_use]
    pub const fn logged_out() -> Self {
        Self {
            token: None,
            user: None,
        }
    }

    /// Logged-in state for a token and user
    #[must_use]
    pub fn logged_in(token: impl Into<String>, user: UserRef) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Build from whatever the store returned; anything partial is logged out
    #[must_use]
    pub fn from_parts(token: Option<String>, user: Option<UserRef>) -> Self {
        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => Self::logged_in(token, user),
            _ => Self::logged_out(),
        }
    }

    /// Whether both a token and a user are present
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Current bearer token
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Current user
    #[must_use]
    pub const fn user(&self) -> Option<&UserRef> {
        self.user.as_ref()
    }

    /// Same user with a replaced token; stays logged out if there was no user
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self::from_parts(Some(token.into()), self.user.clone())
    }
}

/// Decoded payload of a session token. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry as a unix timestamp in seconds
    pub exp: i64,
    /// Subject (user id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued-at unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Remaining claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Decode the middle segment of a `header.payload.signature` token.
    ///
    /// The signature is not verified; the server remains the authority. This
    /// only answers "should we refresh before using it".
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError` when the token is not three segments, the payload
    /// is not base64url, or the payload is not a claims object with `exp`
    pub fn decode(token: &str) -> Result<Self, ClaimsError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(ClaimsError::Malformed {
                segments: segments.len(),
            });
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ClaimsError::Encoding(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Payload(e.to_string()))
    }

    /// `exp <= now`
    #[must_use]
    pub const fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp <= now_secs
    }

    /// Expiry as a timestamp, if representable
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Fresh session token
    pub token: String,
    /// Signed-in user, when the server echoes it back
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Successful token refresh
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    /// Replacement session token
    pub token: String,
    /// Subject of the new token
    #[serde(default)]
    pub user_id: Option<String>,
}
