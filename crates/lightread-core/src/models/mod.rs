// ABOUTME: Core data models shared by every background component
// ABOUTME: Auth state, token claims, summary payloads, and account settings/limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// Account settings, plan limits and theme
pub mod account;
/// Session state, user reference and token claims
pub mod auth;
/// Summary request, response and result payloads
pub mod summary;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub use account::{PlanType, Theme, UserLimits, UserSettings};
pub use auth::{AuthState, LoginRequest, LoginResponse, RefreshResponse, TokenClaims, UserRef};
pub use summary::{
    EnumOption, SaveSummaryRequest, SummaryOptions, SummaryRequest, SummaryResponse,
    SummaryResult, UsageCounter, UsageSnapshot,
};

/// Deserialize an optional field, reading a value of the wrong shape as absent.
///
/// For fields the server may send as `null`, with an unknown variant, or in
/// an older layout, where a bad value must not fail the whole body.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
